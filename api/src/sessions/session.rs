use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqlitePool};

use crate::error::AppResult;

use super::lifecycle::NewSession;

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub sport: String,
    pub custom_sport: Option<String>,
    pub notes: Option<String>,
    pub address: Option<String>,
    pub capacity: i64,
    pub skill_target: String,
    pub positions: Option<Vec<String>>,
    pub equipment_needed: bool,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub host_id: String,
    pub is_open: bool,
    pub created_at: NaiveDateTime,
}

// Positions live in a TEXT column as a JSON array, so the row mapping is
// spelled out instead of derived.
impl<'r> FromRow<'r, SqliteRow> for Session {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let positions: Option<String> = row.try_get("positions")?;
        let positions = positions
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "positions".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            id: row.try_get("id")?,
            sport: row.try_get("sport")?,
            custom_sport: row.try_get("custom_sport")?,
            notes: row.try_get("notes")?,
            address: row.try_get("address")?,
            capacity: row.try_get("capacity")?,
            skill_target: row.try_get("skill_target")?,
            positions,
            equipment_needed: row.try_get("equipment_needed")?,
            starts_at: row.try_get("starts_at")?,
            ends_at: row.try_get("ends_at")?,
            host_id: row.try_get("host_id")?,
            is_open: row.try_get("is_open")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl Session {
    pub async fn from_id(id: i64, db: &SqlitePool) -> AppResult<Option<Self>> {
        let session = sqlx::query_as(
            r#"
            SELECT *
            FROM sessions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;

        Ok(session)
    }
}

pub async fn insert_session(
    db: &SqlitePool,
    session: &NewSession,
    now: NaiveDateTime,
) -> AppResult<i64> {
    let positions = session
        .positions
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO sessions (sport, custom_sport, notes, address, capacity, skill_target,
                              positions, equipment_needed, starts_at, ends_at, host_id,
                              is_open, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&session.sport)
    .bind(&session.custom_sport)
    .bind(&session.notes)
    .bind(&session.address)
    .bind(session.capacity)
    .bind(&session.skill_target)
    .bind(positions)
    .bind(session.equipment_needed)
    .bind(session.starts_at)
    .bind(session.ends_at)
    .bind(&session.host_id)
    .bind(session.is_open)
    .bind(now)
    .fetch_one(db)
    .await?;

    Ok(id)
}
