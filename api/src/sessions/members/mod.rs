mod member;

pub use member::*;

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
pub struct MemberActionParams {
    pub user_id: String,
}

#[debug_handler]
#[tracing::instrument(skip(state))]
pub async fn join_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(params): Json<MemberActionParams>,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now().naive_utc();
    match member::join(&state.db, id, &params.user_id, now).await? {
        Ok(occupancy) => Ok(Json(occupancy).into_response()),
        Err(e) => Ok(e.into_response()),
    }
}

#[debug_handler]
#[tracing::instrument(skip(state))]
pub async fn leave_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(params): Json<MemberActionParams>,
) -> AppResult<impl IntoResponse> {
    match member::leave(&state.db, id, &params.user_id).await? {
        Ok(occupancy) => Ok(Json(occupancy).into_response()),
        Err(e) => Ok(e.into_response()),
    }
}

#[debug_handler]
pub async fn get_members(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    if Session::from_id(id, &state.db).await?.is_none() {
        return Ok((StatusCode::NOT_FOUND, "This session is no longer available").into_response());
    }

    let members = member::roster(&state.db, id).await?;
    Ok(Json(members).into_response())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::future::IntoFuture;

    use crate::profiles::test::create_test_profile;
    use crate::sessions::test::create_test_session;
    use crate::tests::create_test_server;
    use axum_test::TestServer;

    async fn join(server: &TestServer, session_id: i64, user_id: &str) -> axum_test::TestResponse {
        server
            .post(&format!("/sessions/{session_id}/join"))
            .json(&MemberActionParams {
                user_id: user_id.to_string(),
            })
            .await
    }

    async fn leave(server: &TestServer, session_id: i64, user_id: &str) -> axum_test::TestResponse {
        server
            .post(&format!("/sessions/{session_id}/leave"))
            .json(&MemberActionParams {
                user_id: user_id.to_string(),
            })
            .await
    }

    #[tokio::test]
    async fn two_joins_fill_a_capacity_two_session() {
        let server = create_test_server().await;
        create_test_profile(&server, "host-1", Some("Host")).await;
        create_test_profile(&server, "u-1", Some("Alice")).await;
        create_test_profile(&server, "u-2", Some("Bob")).await;
        create_test_profile(&server, "u-3", Some("Cara")).await;
        let session = create_test_session(&server, "host-1", 2).await;

        let response = join(&server, session.id, "u-1").await;
        response.assert_status(StatusCode::OK);
        let occupancy: Occupancy = response.json();
        assert_eq!(occupancy.joined_count, 1);
        assert_eq!(occupancy.spots_left, 1);

        let response = join(&server, session.id, "u-2").await;
        response.assert_status(StatusCode::OK);
        let occupancy: Occupancy = response.json();
        assert_eq!(occupancy.spots_left, 0);

        let response = join(&server, session.id, "u-3").await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.text(), "This session is full");
    }

    #[tokio::test]
    async fn rejoining_reports_already_joined_and_keeps_joined_at() {
        let server = create_test_server().await;
        create_test_profile(&server, "host-1", Some("Host")).await;
        create_test_profile(&server, "u-1", Some("Alice")).await;
        let session = create_test_session(&server, "host-1", 4).await;

        join(&server, session.id, "u-1").await.assert_status_ok();
        let before: Vec<Member> = server
            .get(&format!("/sessions/{}/members", session.id))
            .await
            .json();

        let response = join(&server, session.id, "u-1").await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.text(), "You are already in this session");

        let after: Vec<Member> = server
            .get(&format!("/sessions/{}/members", session.id))
            .await
            .json();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].joined_at, before[0].joined_at);
    }

    #[tokio::test]
    async fn joining_without_a_complete_profile_is_gated() {
        let server = create_test_server().await;
        create_test_profile(&server, "host-1", Some("Host")).await;
        // Provisioned but never named.
        create_test_profile(&server, "u-1", None).await;
        let session = create_test_session(&server, "host-1", 4).await;

        let response = join(&server, session.id, "u-1").await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        // No profile row at all is the same failure.
        let response = join(&server, session.id, "nobody").await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn join_leave_rejoin_refreshes_joined_at() {
        let server = create_test_server().await;
        create_test_profile(&server, "host-1", Some("Host")).await;
        create_test_profile(&server, "u-1", Some("Alice")).await;
        let session = create_test_session(&server, "host-1", 4).await;

        join(&server, session.id, "u-1").await.assert_status_ok();
        let first: Vec<Member> = server
            .get(&format!("/sessions/{}/members", session.id))
            .await
            .json();

        leave(&server, session.id, "u-1").await.assert_status_ok();
        let empty: Vec<Member> = server
            .get(&format!("/sessions/{}/members", session.id))
            .await
            .json();
        assert!(empty.is_empty());

        join(&server, session.id, "u-1").await.assert_status_ok();
        let second: Vec<Member> = server
            .get(&format!("/sessions/{}/members", session.id))
            .await
            .json();
        assert_eq!(second.len(), 1);
        assert!(second[0].joined_at > first[0].joined_at);
    }

    #[tokio::test]
    async fn leaving_when_not_a_member_is_an_explicit_error() {
        let server = create_test_server().await;
        create_test_profile(&server, "host-1", Some("Host")).await;
        create_test_profile(&server, "u-1", Some("Alice")).await;
        let session = create_test_session(&server, "host-1", 4).await;

        let response = leave(&server, session.id, "u-1").await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.text(), "You are not a member of this session");

        // Leave, then leave again: the second call errors, the state stays
        // left either way.
        join(&server, session.id, "u-1").await.assert_status_ok();
        leave(&server, session.id, "u-1").await.assert_status_ok();
        let response = leave(&server, session.id, "u-1").await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn joining_a_missing_session_is_not_found() {
        let server = create_test_server().await;
        create_test_profile(&server, "u-1", Some("Alice")).await;

        let response = join(&server, 9999, "u-1").await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn roster_orders_by_join_time_then_user_id() {
        let server = create_test_server().await;
        create_test_profile(&server, "host-1", Some("Host")).await;
        create_test_profile(&server, "u-1", Some("Alice")).await;
        create_test_profile(&server, "u-2", Some("Bob")).await;
        create_test_profile(&server, "u-3", Some("Cara")).await;
        let session = create_test_session(&server, "host-1", 8).await;

        join(&server, session.id, "u-2").await.assert_status_ok();
        join(&server, session.id, "u-3").await.assert_status_ok();
        join(&server, session.id, "u-1").await.assert_status_ok();

        let roster: Vec<Member> = server
            .get(&format!("/sessions/{}/members", session.id))
            .await
            .json();
        let order: Vec<&str> = roster.iter().map(|m| m.user_id.as_str()).collect();
        assert_eq!(order, vec!["u-2", "u-3", "u-1"]);
        assert_eq!(roster[0].name.as_deref(), Some("Bob"));
    }

    #[tokio::test]
    async fn concurrent_joins_never_overshoot_capacity() {
        let server = create_test_server().await;
        create_test_profile(&server, "host-1", Some("Host")).await;
        create_test_profile(&server, "u-1", Some("Alice")).await;
        create_test_profile(&server, "u-2", Some("Bob")).await;
        create_test_profile(&server, "u-3", Some("Cara")).await;
        let session = create_test_session(&server, "host-1", 2).await;

        let (r1, r2, r3) = tokio::join!(
            server
                .post(&format!("/sessions/{}/join", session.id))
                .json(&MemberActionParams {
                    user_id: "u-1".to_string(),
                })
                .into_future(),
            server
                .post(&format!("/sessions/{}/join", session.id))
                .json(&MemberActionParams {
                    user_id: "u-2".to_string(),
                })
                .into_future(),
            server
                .post(&format!("/sessions/{}/join", session.id))
                .json(&MemberActionParams {
                    user_id: "u-3".to_string(),
                })
                .into_future(),
        );

        let statuses = [r1.status_code(), r2.status_code(), r3.status_code()];
        let successes = statuses.iter().filter(|s| **s == StatusCode::OK).count();
        let fulls = statuses
            .iter()
            .filter(|s| **s == StatusCode::CONFLICT)
            .count();
        assert_eq!(successes, 2);
        assert_eq!(fulls, 1);

        let roster: Vec<Member> = server
            .get(&format!("/sessions/{}/members", session.id))
            .await
            .json();
        assert_eq!(roster.len(), 2);
    }
}
