use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::error::AppResult;

/// A directory entry for one user. Ids are opaque strings issued by the
/// identity provider; `name` stays empty until the user finishes setup.
#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Profile {
    pub async fn from_id(id: &str, db: &SqlitePool) -> AppResult<Option<Self>> {
        let profile = sqlx::query_as(
            r#"
            SELECT id, email, name, created_at, updated_at
            FROM profiles
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;

        Ok(profile)
    }
}
