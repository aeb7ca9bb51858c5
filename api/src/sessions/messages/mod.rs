mod message;

pub use message::*;

use crate::error::AppResult;
use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::sessions::Session;
use crate::AppState;

#[derive(Debug, Deserialize, Serialize)]
pub struct PostMessageParams {
    pub user_id: String,
    pub body: String,
}

#[debug_handler]
#[tracing::instrument(skip(state))]
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(params): Json<PostMessageParams>,
) -> AppResult<impl IntoResponse> {
    let body = params.body.trim();
    if body.is_empty() {
        return Ok((StatusCode::BAD_REQUEST, "Message cannot be empty").into_response());
    }
    if Session::from_id(id, &state.db).await?.is_none() {
        return Ok((StatusCode::NOT_FOUND, "This session is no longer available").into_response());
    }
    if !message::is_participant(&state.db, id, &params.user_id).await? {
        return Ok((StatusCode::FORBIDDEN, "Only session members can post messages").into_response());
    }

    let now = Utc::now().naive_utc();
    let message = message::insert_message(&state.db, id, &params.user_id, body, now).await?;

    Ok((StatusCode::CREATED, Json(message)).into_response())
}

#[debug_handler]
pub async fn get_messages(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    if Session::from_id(id, &state.db).await?.is_none() {
        return Ok((StatusCode::NOT_FOUND, "This session is no longer available").into_response());
    }

    let messages = message::list_messages(&state.db, id).await?;
    Ok(Json(messages).into_response())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::profiles::test::create_test_profile;
    use crate::sessions::members::MemberActionParams;
    use crate::sessions::test::create_test_session;
    use crate::tests::create_test_server;
    use axum_test::TestServer;

    async fn post(
        server: &TestServer,
        session_id: i64,
        user_id: &str,
        body: &str,
    ) -> axum_test::TestResponse {
        server
            .post(&format!("/sessions/{session_id}/messages"))
            .json(&PostMessageParams {
                user_id: user_id.to_string(),
                body: body.to_string(),
            })
            .await
    }

    #[tokio::test]
    async fn host_and_members_can_chat_in_order() {
        let server = create_test_server().await;
        create_test_profile(&server, "host-1", Some("Host")).await;
        create_test_profile(&server, "u-1", Some("Alice")).await;
        let session = create_test_session(&server, "host-1", 4).await;
        server
            .post(&format!("/sessions/{}/join", session.id))
            .json(&MemberActionParams {
                user_id: "u-1".to_string(),
            })
            .await
            .assert_status_ok();

        let response = post(&server, session.id, "host-1", "Who's bringing a ball?").await;
        response.assert_status(StatusCode::CREATED);
        let message: ChatMessage = response.json();
        assert_eq!(message.sender_name.as_deref(), Some("Host"));

        post(&server, session.id, "u-1", "I got one")
            .await
            .assert_status(StatusCode::CREATED);

        let messages: Vec<ChatMessage> = server
            .get(&format!("/sessions/{}/messages", session.id))
            .await
            .json();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].body, "Who's bringing a ball?");
        assert_eq!(messages[1].sender_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn non_members_cannot_post() {
        let server = create_test_server().await;
        create_test_profile(&server, "host-1", Some("Host")).await;
        create_test_profile(&server, "u-1", Some("Alice")).await;
        let session = create_test_session(&server, "host-1", 4).await;

        let response = post(&server, session.id, "u-1", "hello?").await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn blank_messages_are_rejected() {
        let server = create_test_server().await;
        create_test_profile(&server, "host-1", Some("Host")).await;
        let session = create_test_session(&server, "host-1", 4).await;

        let response = post(&server, session.id, "host-1", "   ").await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn messages_for_a_missing_session_are_not_found() {
        let server = create_test_server().await;
        let response = server.get("/sessions/9999/messages").await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
