//! Attendance record domain model and request/response payloads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::event::CheckInMethod;

/// Lateness bucket produced by the status classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late10,
    Late30,
    VeryLate,
}

impl AttendanceStatus {
    /// Converts to the stored status label.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late10 => "late_10",
            AttendanceStatus::Late30 => "late_30",
            AttendanceStatus::VeryLate => "very_late",
        }
    }
}

/// One live attendance record per (event, occurrence, participant).
///
/// The occurrence date is `None` for non-recurring events; the backing
/// store enforces uniqueness over live rows only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub event_id: String,
    pub occurrence_date: Option<NaiveDate>,
    pub participant_id: String,
    pub team_id: String,
    pub method: CheckInMethod,
    pub checked_in_at: DateTime<Utc>,
    pub status: String,
    pub late: bool,
    pub late_minutes: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_from_event_m: Option<f64>,
    pub device_hash: Option<String>,
    pub suspect: bool,
    pub suspect_reason: Option<String>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub deleted: bool,
    pub deleted_by: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insert shape for a new attendance record; row id and timestamps are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAttendanceRecord {
    pub event_id: String,
    pub occurrence_date: Option<NaiveDate>,
    pub participant_id: String,
    pub team_id: String,
    pub method: CheckInMethod,
    pub checked_in_at: DateTime<Utc>,
    pub status: String,
    pub late: bool,
    pub late_minutes: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_from_event_m: Option<f64>,
    pub device_hash: Option<String>,
    pub suspect: bool,
    pub suspect_reason: Option<String>,
}

/// Check-in request payload.
///
/// `occurrence_ref` is `<eventId>` or `<eventId>:<YYYY-MM-DD>`; the
/// optional `occurrence_date` is the explicit occurrence-date argument
/// (a reference-suffix date wins when both are present).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    #[validate(length(min = 1, message = "Occurrence reference must not be empty"))]
    pub occurrence_ref: String,

    pub method: CheckInMethod,

    pub occurrence_date: Option<NaiveDate>,

    pub override_target_participant: Option<String>,

    pub override_status: Option<String>,

    pub token: Option<String>,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: Option<f64>,

    pub device_identity_hash: Option<String>,
}

/// Check-out request payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutRequest {
    #[validate(length(min = 1, message = "Occurrence reference must not be empty"))]
    pub occurrence_ref: String,
}

/// Response payload for attendance operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecordResponse {
    pub id: Uuid,
    pub event_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrence_date: Option<NaiveDate>,
    pub participant_id: String,
    pub team_id: String,
    pub method: CheckInMethod,
    pub checked_in_at: DateTime<Utc>,
    pub status: String,
    pub late: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub late_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_from_event_m: Option<f64>,
    pub suspect: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspect_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_out_at: Option<DateTime<Utc>>,
}

impl From<AttendanceRecord> for AttendanceRecordResponse {
    fn from(r: AttendanceRecord) -> Self {
        Self {
            id: r.id,
            event_id: r.event_id,
            occurrence_date: r.occurrence_date,
            participant_id: r.participant_id,
            team_id: r.team_id,
            method: r.method,
            checked_in_at: r.checked_in_at,
            status: r.status,
            late: r.late,
            late_minutes: r.late_minutes,
            distance_from_event_m: r.distance_from_event_m,
            suspect: r.suspect,
            suspect_reason: r.suspect_reason,
            checked_out_at: r.checked_out_at,
        }
    }
}
