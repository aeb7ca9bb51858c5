//! Membership state per (session, user): no row, `joined`, or `left`.
//! The primary key on (session_id, user_id) is what guarantees at most
//! one active row per pair; rejoining flips the old row instead of
//! inserting a second one.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::error::AppResult;
use crate::sessions::lifecycle;

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct Member {
    pub user_id: String,
    pub name: Option<String>,
    pub joined_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Occupancy {
    pub joined_count: i64,
    pub spots_left: i64,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("You are already in this session")]
    AlreadyJoined,
    #[error("This session is full")]
    SessionFull,
    #[error("Complete your profile before joining sessions")]
    ProfileIncomplete,
    #[error("This session is no longer available")]
    NotFound,
}

impl IntoResponse for JoinError {
    fn into_response(self) -> Response {
        let status = match self {
            JoinError::AlreadyJoined | JoinError::SessionFull => StatusCode::CONFLICT,
            JoinError::ProfileIncomplete => StatusCode::UNPROCESSABLE_ENTITY,
            JoinError::NotFound => StatusCode::NOT_FOUND,
        };
        (status, self.to_string()).into_response()
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum LeaveError {
    #[error("You are not a member of this session")]
    NotAMember,
    #[error("This session is no longer available")]
    NotFound,
}

impl IntoResponse for LeaveError {
    fn into_response(self) -> Response {
        let status = match self {
            LeaveError::NotAMember => StatusCode::CONFLICT,
            LeaveError::NotFound => StatusCode::NOT_FOUND,
        };
        (status, self.to_string()).into_response()
    }
}

pub async fn joined_count(db: &SqlitePool, session_id: i64) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM session_members
        WHERE session_id = ? AND status = 'joined'
        "#,
    )
    .bind(session_id)
    .fetch_one(db)
    .await?;

    Ok(count)
}

pub async fn join(
    db: &SqlitePool,
    session_id: i64,
    user_id: &str,
    now: NaiveDateTime,
) -> AppResult<Result<Occupancy, JoinError>> {
    // Profile gate, checked fresh on every attempt.
    let name: Option<Option<String>> = sqlx::query_scalar("SELECT name FROM profiles WHERE id = ?")
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    match name {
        Some(Some(name)) if !name.trim().is_empty() => {}
        _ => return Ok(Err(JoinError::ProfileIncomplete)),
    }

    let session: Option<(i64, bool)> =
        sqlx::query_as("SELECT capacity, is_open FROM sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(db)
            .await?;
    let Some((capacity, is_open)) = session else {
        return Ok(Err(JoinError::NotFound));
    };
    if !is_open {
        return Ok(Err(JoinError::NotFound));
    }

    if membership_status(db, session_id, user_id).await?.as_deref() == Some("joined") {
        return Ok(Err(JoinError::AlreadyJoined));
    }

    // Capacity check and the slot-consuming write happen in one statement,
    // so two racing joins cannot both observe a free spot. A stale `left`
    // row is revived through the conflict clause with a fresh joined_at.
    let result = sqlx::query(
        r#"
        INSERT INTO session_members (session_id, user_id, status, joined_at)
        SELECT ?1, ?2, 'joined', ?3
        WHERE (SELECT COUNT(*) FROM session_members
               WHERE session_id = ?1 AND status = 'joined')
            < (SELECT capacity FROM sessions WHERE id = ?1)
        ON CONFLICT (session_id, user_id) DO UPDATE
        SET status = 'joined', joined_at = excluded.joined_at
        WHERE session_members.status = 'left'
        "#,
    )
    .bind(session_id)
    .bind(user_id)
    .bind(now)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        // A same-user join racing past the check above lands here as a
        // conflict no-op rather than a consumed slot.
        if membership_status(db, session_id, user_id).await?.as_deref() == Some("joined") {
            return Ok(Err(JoinError::AlreadyJoined));
        }
        return Ok(Err(JoinError::SessionFull));
    }

    let joined = joined_count(db, session_id).await?;
    Ok(Ok(Occupancy {
        joined_count: joined,
        spots_left: lifecycle::spots_left(capacity, joined),
    }))
}

pub async fn leave(
    db: &SqlitePool,
    session_id: i64,
    user_id: &str,
) -> AppResult<Result<Occupancy, LeaveError>> {
    let capacity: Option<i64> = sqlx::query_scalar("SELECT capacity FROM sessions WHERE id = ?")
        .bind(session_id)
        .fetch_optional(db)
        .await?;
    let Some(capacity) = capacity else {
        return Ok(Err(LeaveError::NotFound));
    };

    let result = sqlx::query(
        r#"
        UPDATE session_members
        SET status = 'left'
        WHERE session_id = ? AND user_id = ? AND status = 'joined'
        "#,
    )
    .bind(session_id)
    .bind(user_id)
    .execute(db)
    .await?;

    // Leaving twice is reported, not silently absorbed, so the client can
    // tell a stale button from a real transition.
    if result.rows_affected() == 0 {
        return Ok(Err(LeaveError::NotAMember));
    }

    let joined = joined_count(db, session_id).await?;
    Ok(Ok(Occupancy {
        joined_count: joined,
        spots_left: lifecycle::spots_left(capacity, joined),
    }))
}

/// Active members, oldest join first; ties broken by user id so the
/// ordering is stable.
pub async fn roster(db: &SqlitePool, session_id: i64) -> AppResult<Vec<Member>> {
    let members = sqlx::query_as(
        r#"
        SELECT m.user_id, p.name, m.joined_at
        FROM session_members m
        LEFT JOIN profiles p ON p.id = m.user_id
        WHERE m.session_id = ? AND m.status = 'joined'
        ORDER BY m.joined_at ASC, m.user_id ASC
        "#,
    )
    .bind(session_id)
    .fetch_all(db)
    .await?;

    Ok(members)
}

async fn membership_status(
    db: &SqlitePool,
    session_id: i64,
    user_id: &str,
) -> AppResult<Option<String>> {
    let status = sqlx::query_scalar(
        "SELECT status FROM session_members WHERE session_id = ? AND user_id = ?",
    )
    .bind(session_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(status)
}
