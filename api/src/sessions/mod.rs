pub mod lifecycle;
pub mod members;
pub mod messages;
mod session;
mod title;

pub use lifecycle::*;
pub use session::*;
pub use title::make_title;

use crate::error::AppResult;
use axum::{
    debug_handler,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::profiles;
use crate::AppState;

#[debug_handler]
#[tracing::instrument(skip(state, params))]
pub async fn create_session(
    State(state): State<AppState>,
    Json(params): Json<CreateSessionParams>,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now().naive_utc();

    let new_session = match lifecycle::validate_and_build(&params, now) {
        Ok(session) => session,
        Err(e) => return Ok(e.into_response()),
    };

    // The host must resolve in the directory before anything points at it.
    profiles::ensure_profile(&state.db, &params.host_id, &params.host_email).await?;

    let id = insert_session(&state.db, &new_session, now).await?;
    let session = Session::from_id(id, &state.db)
        .await?
        .ok_or_else(|| anyhow::anyhow!("session missing after insert"))?;

    Ok((StatusCode::CREATED, Json(session)).into_response())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedItem {
    #[serde(flatten)]
    pub session: Session,
    pub spots_left: i64,
    pub title: String,
}

/// Open sessions starting within the feed window, soonest first, each
/// annotated with a point-in-time occupancy estimate.
#[debug_handler]
pub async fn get_feed(State(state): State<AppState>) -> AppResult<Json<Vec<FeedItem>>> {
    let now = Utc::now().naive_utc();
    let horizon = now + Duration::days(FEED_WINDOW_DAYS);

    let sessions: Vec<Session> = sqlx::query_as(
        r#"
        SELECT *
        FROM sessions
        WHERE is_open = TRUE AND starts_at >= ? AND starts_at <= ?
        ORDER BY starts_at ASC
        LIMIT ?
        "#,
    )
    .bind(now)
    .bind(horizon)
    .bind(FEED_LIMIT)
    .fetch_all(&state.db)
    .await?;

    let mut feed = Vec::with_capacity(sessions.len());
    for session in sessions {
        let joined = members::joined_count(&state.db, session.id).await?;
        feed.push(FeedItem {
            spots_left: spots_left(session.capacity, joined),
            title: make_title(&session, now),
            session,
        });
    }

    Ok(Json(feed))
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: Session,
    pub host_name: Option<String>,
    pub joined_count: i64,
    pub spots_left: i64,
    pub title: String,
}

#[debug_handler]
pub async fn get_session_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let Some(session) = Session::from_id(id, &state.db).await? else {
        return Ok((StatusCode::NOT_FOUND, "This session is no longer available").into_response());
    };

    let host_name: Option<Option<String>> =
        sqlx::query_scalar("SELECT name FROM profiles WHERE id = ?")
            .bind(&session.host_id)
            .fetch_optional(&state.db)
            .await?;
    let joined = members::joined_count(&state.db, id).await?;

    let detail = SessionDetail {
        host_name: host_name.flatten(),
        joined_count: joined,
        spots_left: spots_left(session.capacity, joined),
        title: make_title(&session, Utc::now().naive_utc()),
        session,
    };

    Ok(Json(detail).into_response())
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DeleteSessionParams {
    pub user_id: String,
}

/// Host-only. Memberships and chat messages go with the session.
#[debug_handler]
#[tracing::instrument(skip(state))]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<DeleteSessionParams>,
) -> AppResult<impl IntoResponse> {
    let host: Option<String> = sqlx::query_scalar("SELECT host_id FROM sessions WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let Some(host) = host else {
        return Ok((StatusCode::NOT_FOUND, "This session is no longer available").into_response());
    };
    if host != params.user_id {
        return Ok((StatusCode::FORBIDDEN, "Only the host can delete a session").into_response());
    }

    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
