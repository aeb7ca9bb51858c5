//! Session creation rules: what may be scheduled, when, and for how many
//! players. Everything here is pure; the caller supplies `now` so the
//! rules stay testable without a clock.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::venues;

pub const MIN_CAPACITY: i64 = 2;
pub const MAX_CAPACITY: i64 = 50;
pub const LEAD_TIME_MINUTES: i64 = 15;
pub const HORIZON_DAYS: i64 = 2;

/// Feed window, matching the mobile client: open sessions starting within
/// the next week, twenty at a time.
pub const FEED_WINDOW_DAYS: i64 = 7;
pub const FEED_LIMIT: i64 = 20;

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateSessionParams {
    pub host_id: String,
    pub host_email: String,
    pub sport: Option<String>,
    pub custom_sport: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub venue: Option<String>,
    pub custom_location: Option<String>,
    pub capacity: i64,
    pub skill_target: Option<String>,
    #[serde(default)]
    pub positions: Vec<String>,
    #[serde(default)]
    pub equipment_needed: bool,
    pub notes: Option<String>,
}

/// A validated session, ready to insert. `sport` is already normalized
/// (`"Custom"` plus the original label) and `skill_target` encoded.
#[derive(Debug, PartialEq)]
pub struct NewSession {
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
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please select a sport")]
    SportMissing,
    #[error("Please enter a custom sport name")]
    CustomSportMissing,
    #[error("Please select a date")]
    DateMissing,
    #[error("Please select a start time")]
    StartTimeMissing,
    #[error("Please select an end time")]
    EndTimeMissing,
    #[error("Please select or enter a location")]
    LocationMissing,
    #[error("End time must be after start time")]
    EndBeforeStart,
    #[error("Start time must be at least 15 minutes from now")]
    StartsTooSoon,
    #[error("Sessions can only be scheduled up to 2 days ahead")]
    StartsTooFar,
    #[error("Sessions cannot be scheduled in the past")]
    DateInPast,
    #[error("Capacity must be between 2 and 50")]
    CapacityOutOfRange,
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()).into_response()
    }
}

/// Applies the creation rules in order and builds the normalized session.
/// The first rule to fail wins; nothing is persisted here.
pub fn validate_and_build(
    params: &CreateSessionParams,
    now: NaiveDateTime,
) -> Result<NewSession, ValidationError> {
    let sport = params.sport.as_deref().unwrap_or("").trim();
    if sport.is_empty() {
        return Err(ValidationError::SportMissing);
    }
    let custom_sport = params.custom_sport.as_deref().unwrap_or("").trim();
    if sport == "Other" && custom_sport.is_empty() {
        return Err(ValidationError::CustomSportMissing);
    }

    let date = params.date.ok_or(ValidationError::DateMissing)?;
    let start_time = params.start_time.ok_or(ValidationError::StartTimeMissing)?;
    let end_time = params.end_time.ok_or(ValidationError::EndTimeMissing)?;

    let address = resolve_address(params)?;

    let starts_at = date.and_time(start_time);
    let ends_at = date.and_time(end_time);
    if ends_at <= starts_at {
        return Err(ValidationError::EndBeforeStart);
    }
    if starts_at < now + Duration::minutes(LEAD_TIME_MINUTES) {
        return Err(ValidationError::StartsTooSoon);
    }
    // Upper bound is day-granular: anything on the day after tomorrow is
    // still schedulable, regardless of time of day.
    if starts_at.date() > now.date() + Duration::days(HORIZON_DAYS) {
        return Err(ValidationError::StartsTooFar);
    }
    if date < now.date() {
        return Err(ValidationError::DateInPast);
    }
    if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&params.capacity) {
        return Err(ValidationError::CapacityOutOfRange);
    }

    Ok(NewSession {
        sport: if sport == "Other" { "Custom" } else { sport }.to_string(),
        custom_sport: (sport == "Other").then(|| custom_sport.to_string()),
        notes: params
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from),
        address: Some(address),
        capacity: params.capacity,
        skill_target: skill_code(params.skill_target.as_deref()).to_string(),
        positions: normalize_positions(&params.positions),
        equipment_needed: params.equipment_needed,
        starts_at,
        ends_at,
        host_id: params.host_id.clone(),
        is_open: true,
    })
}

/// A trimmed custom location wins; otherwise the venue key must be known.
fn resolve_address(params: &CreateSessionParams) -> Result<String, ValidationError> {
    if let Some(custom) = params
        .custom_location
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        return Ok(custom.to_string());
    }

    params
        .venue
        .as_deref()
        .filter(|v| !v.is_empty())
        .and_then(venues::venue_name)
        .map(String::from)
        .ok_or(ValidationError::LocationMissing)
}

fn skill_code(label: Option<&str>) -> &'static str {
    match label {
        Some("Beginner") => "B",
        Some("Intermediate") => "I",
        Some("Advanced") => "A",
        _ => "Any",
    }
}

/// "Any" is a sentinel for no preference and "Other" is the picker
/// placeholder; a list reduced to nothing becomes `None`.
fn normalize_positions(positions: &[String]) -> Option<Vec<String>> {
    if positions.is_empty() || positions.iter().any(|p| p == "Any") {
        return None;
    }
    let real: Vec<String> = positions.iter().filter(|p| *p != "Other").cloned().collect();
    if real.is_empty() {
        None
    } else {
        Some(real)
    }
}

pub fn spots_left(capacity: i64, joined_count: i64) -> i64 {
    (capacity - joined_count).max(0)
}
