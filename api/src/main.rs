mod error;
mod profiles;
mod sessions;
mod settings;
mod sqlite;
mod venues;

use error::AppResult;
use settings::Settings;

use anyhow::Result;
use tokio::{net::TcpListener, time::Instant};

use axum::{
    routing::{delete, get, post, put},
    serve, Router,
};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
struct AppState {
    db: sqlx::Pool<sqlx::Sqlite>,
}

async fn create_app(db_url: &str) -> Result<Router> {
    let db = sqlite::create_pool(db_url).await?;

    let app_state = AppState { db };

    let app = Router::new()
        .route("/hi", get(|| async { "Hello, World!" }))
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/feed", get(sessions::get_feed))
        .route("/sessions/{id}", get(sessions::get_session_by_id))
        .route("/sessions/{id}", delete(sessions::delete_session))
        .route("/sessions/{id}/join", post(sessions::members::join_session))
        .route("/sessions/{id}/leave", post(sessions::members::leave_session))
        .route("/sessions/{id}/members", get(sessions::members::get_members))
        .route("/sessions/{id}/messages", get(sessions::messages::get_messages))
        .route("/sessions/{id}/messages", post(sessions::messages::post_message))
        .route("/profiles", post(profiles::upsert_profile))
        .route("/profiles/{id}", get(profiles::get_profile))
        .route("/profiles/{id}", put(profiles::update_profile))
        .with_state(app_state);

    Ok(app)
}

#[tokio::main]
async fn main() -> AppResult<()> {
    dotenv::dotenv().ok();
    dotenv::from_path("./api/").ok();

    let start = Instant::now();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let settings = Settings::load()?;

    let app = create_app(&settings.database_url).await?;

    let listener = TcpListener::bind(format!("0.0.0.0:{}", settings.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    // Create a shutdown signal handler
    let shutdown = async move {
        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = signal::ctrl_c() => {},
            _ = terminate => {},
        }
        let duration = start.elapsed();
        info!("Shutting down gracefully... in {:?}", duration);
    };

    // Start the server with graceful shutdown
    let server = serve(listener, app).with_graceful_shutdown(shutdown);

    if let Err(e) = server.await {
        eprintln!("Server error: {}", e);
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum_test::TestServer;
    use tracing_test::traced_test;

    pub async fn create_test_server() -> TestServer {
        let app = create_app("sqlite::memory:").await.unwrap();

        TestServer::new(app).unwrap()
    }

    // Test the hello world endpoint
    #[tokio::test]
    #[traced_test]
    async fn test_hello_endpoint() {
        let server = create_test_server().await;
        let response = server.get("/hi").await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.text(), "Hello, World!");
    }
}
