use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::error::AppResult;

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub session_id: i64,
    pub user_id: String,
    pub sender_name: Option<String>,
    pub body: String,
    pub created_at: NaiveDateTime,
}

/// Chat is scoped to the roster: the host or an active member.
pub async fn is_participant(db: &SqlitePool, session_id: i64, user_id: &str) -> AppResult<bool> {
    let host: Option<String> = sqlx::query_scalar("SELECT host_id FROM sessions WHERE id = ?")
        .bind(session_id)
        .fetch_optional(db)
        .await?;
    match host {
        None => Ok(false),
        Some(host) if host == user_id => Ok(true),
        Some(_) => {
            let status: Option<String> = sqlx::query_scalar(
                "SELECT status FROM session_members WHERE session_id = ? AND user_id = ?",
            )
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(db)
            .await?;
            Ok(status.as_deref() == Some("joined"))
        }
    }
}

pub async fn insert_message(
    db: &SqlitePool,
    session_id: i64,
    user_id: &str,
    body: &str,
    now: NaiveDateTime,
) -> AppResult<ChatMessage> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO messages (session_id, user_id, body, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(session_id)
    .bind(user_id)
    .bind(body)
    .bind(now)
    .fetch_one(db)
    .await?;

    let message = sqlx::query_as(
        r#"
        SELECT m.id, m.session_id, m.user_id, p.name AS sender_name, m.body, m.created_at
        FROM messages m
        LEFT JOIN profiles p ON p.id = m.user_id
        WHERE m.id = ?
        "#,
    )
    .bind(id)
    .fetch_one(db)
    .await?;

    Ok(message)
}

pub async fn list_messages(db: &SqlitePool, session_id: i64) -> AppResult<Vec<ChatMessage>> {
    let messages = sqlx::query_as(
        r#"
        SELECT m.id, m.session_id, m.user_id, p.name AS sender_name, m.body, m.created_at
        FROM messages m
        LEFT JOIN profiles p ON p.id = m.user_id
        WHERE m.session_id = ?
        ORDER BY m.created_at ASC, m.id ASC
        "#,
    )
    .bind(session_id)
    .fetch_all(db)
    .await?;

    Ok(messages)
}
