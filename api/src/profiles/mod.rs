mod profile;

pub use profile::*;

use anyhow::anyhow;
use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::AppResult;
use crate::AppState;

#[derive(Debug, Deserialize, Serialize)]
pub struct UpsertProfileParams {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

/// Hosts get a minimal profile on session creation if they never made
/// one: the display name falls back to the local part of their email.
/// Safe to call repeatedly.
pub async fn ensure_profile(db: &SqlitePool, id: &str, email: &str) -> AppResult<()> {
    let fallback_name = email.split('@').next().unwrap_or(email);
    sqlx::query(
        r#"
        INSERT INTO profiles (id, email, name)
        VALUES (?, ?, ?)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(email)
    .bind(fallback_name)
    .execute(db)
    .await?;

    Ok(())
}

#[debug_handler]
#[tracing::instrument(skip(state))]
pub async fn upsert_profile(
    State(state): State<AppState>,
    Json(params): Json<UpsertProfileParams>,
) -> AppResult<impl IntoResponse> {
    sqlx::query(
        r#"
        INSERT INTO profiles (id, email, name)
        VALUES (?, ?, ?)
        ON CONFLICT (id) DO UPDATE
        SET email = excluded.email,
            name = COALESCE(excluded.name, profiles.name),
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&params.id)
    .bind(&params.email)
    .bind(&params.name)
    .execute(&state.db)
    .await?;

    let profile = Profile::from_id(&params.id, &state.db)
        .await?
        .ok_or_else(|| anyhow!("profile missing after upsert"))?;

    Ok((StatusCode::CREATED, Json(profile)).into_response())
}

#[debug_handler]
#[tracing::instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let profile = Profile::from_id(&id, &state.db).await?;

    match profile {
        Some(profile) => Ok(Json(profile).into_response()),
        None => Ok((StatusCode::NOT_FOUND, "Profile not found").into_response()),
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateProfileParams {
    pub name: String,
}

#[debug_handler]
#[tracing::instrument(skip(state))]
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(params): Json<UpdateProfileParams>,
) -> AppResult<impl IntoResponse> {
    let name = params.name.trim();
    if name.is_empty() {
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, "Please enter your name").into_response());
    }

    let result = sqlx::query(
        r#"
        UPDATE profiles
        SET name = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(&id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Ok((StatusCode::NOT_FOUND, "Profile not found").into_response());
    }

    let profile = Profile::from_id(&id, &state.db)
        .await?
        .ok_or_else(|| anyhow!("profile missing after update"))?;

    Ok(Json(profile).into_response())
}
