//! Attendance route handlers: check-in, check-out, record removal.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::attendance::{AttendanceRecordResponse, CheckInRequest, CheckOutRequest};
use domain::models::event::CheckInMethod;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Caller;
use crate::middleware::metrics::record_check_in;

/// POST /api/v1/attendance/check-in
///
/// Self-service check-ins must carry a device identity hash; that is a
/// caller contract enforced at the edge, before the engine runs.
pub async fn check_in(
    State(state): State<AppState>,
    caller: Caller,
    Json(mut payload): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<AttendanceRecordResponse>), ApiError> {
    payload.validate()?;

    if payload.method != CheckInMethod::Override && payload.device_identity_hash.is_none() {
        return Err(ApiError::Validation(
            "deviceIdentityHash is required for self-service check-ins".to_string(),
        ));
    }

    // Normalize whatever identity material the client sent into a
    // fixed-width fingerprint before it reaches the engine or storage.
    payload.device_identity_hash = payload
        .device_identity_hash
        .map(|raw| shared::crypto::sha256_hex(&raw));

    let record = state
        .engine
        .check_in(&caller.participant_id, &payload)
        .await?;

    record_check_in(record.method.as_str(), &record.status, record.suspect);

    Ok((
        StatusCode::CREATED,
        Json(AttendanceRecordResponse::from(record)),
    ))
}

/// POST /api/v1/attendance/check-out
pub async fn check_out(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CheckOutRequest>,
) -> Result<Json<AttendanceRecordResponse>, ApiError> {
    payload.validate()?;

    let record = state
        .engine
        .check_out(&caller.participant_id, &payload)
        .await?;

    Ok(Json(AttendanceRecordResponse::from(record)))
}

/// DELETE /api/v1/attendance/:record_id
///
/// Soft-deletes a record. Only callers qualified to mark others
/// (owners, coaches, team managers) may remove records; the row is
/// retained for audit and its occurrence key is freed for re-check-in.
pub async fn delete_record(
    State(state): State<AppState>,
    caller: Caller,
    Path(record_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let record = state
        .attendance
        .find_by_id(record_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".to_string()))?;

    if record.deleted {
        return Err(ApiError::NotFound(
            "Attendance record not found".to_string(),
        ));
    }

    state
        .require_marker_role(&record.team_id, &caller.participant_id)
        .await?;

    state
        .attendance
        .soft_delete(record_id, &caller.participant_id, chrono::Utc::now())
        .await?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".to_string()))?;

    tracing::info!(
        record_id = %record_id,
        deleted_by = %caller.participant_id,
        "Attendance record removed"
    );

    Ok(StatusCode::NO_CONTENT)
}
