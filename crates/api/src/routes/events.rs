//! Event-scoped route handlers: scan-token issuance and attendance listing.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use domain::models::attendance::AttendanceRecordResponse;
use domain::models::event::Event;
use domain::services::occurrence::{resolve, OccurrenceRef};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Caller;

/// Request body for scan-token issuance. The occurrence may also be
/// addressed by a date suffix on the path reference.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanTokenRequest {
    pub occurrence_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanTokenResponse {
    pub token: String,
}

/// POST /api/v1/events/:event_ref/scan-token
pub async fn issue_scan_token(
    State(state): State<AppState>,
    caller: Caller,
    Path(event_ref): Path<String>,
    Json(payload): Json<ScanTokenRequest>,
) -> Result<(StatusCode, Json<ScanTokenResponse>), ApiError> {
    let token = state
        .engine
        .issue_scan_token(&caller.participant_id, &event_ref, payload.occurrence_date)
        .await?;

    Ok((StatusCode::CREATED, Json(ScanTokenResponse { token })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListAttendanceQuery {
    pub occurrence_date: Option<NaiveDate>,
}

/// GET /api/v1/events/:event_ref/attendance
///
/// Lists live attendance for one occurrence, newest check-in first.
/// Restricted to callers qualified to mark others.
pub async fn list_attendance(
    State(state): State<AppState>,
    caller: Caller,
    Path(event_ref): Path<String>,
    Query(query): Query<ListAttendanceQuery>,
) -> Result<Json<Vec<AttendanceRecordResponse>>, ApiError> {
    let reference = OccurrenceRef::parse(&event_ref).map_err(ApiError::from)?;
    let event: Event = state
        .events
        .find_by_id(&reference.event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Event {} not found", reference.event_id)))?
        .into();

    state
        .require_marker_role(&event.team_id, &caller.participant_id)
        .await?;

    let occurrence = resolve(event, &reference, query.occurrence_date)?;

    let records = state
        .attendance
        .list_for_occurrence(&occurrence.event.id, occurrence.occurrence_date)
        .await?;

    Ok(Json(
        records
            .into_iter()
            .map(|entity| AttendanceRecordResponse::from(domain::models::attendance::AttendanceRecord::from(entity)))
            .collect(),
    ))
}
