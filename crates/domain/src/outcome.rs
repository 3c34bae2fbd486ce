//! Tagged failure outcome for the check-in engine.
//!
//! Every engine stage returns `Outcome<T>`; a failure carries a stable
//! code and a human-readable message. Failures never unwind across a
//! component boundary as panics; the orchestrator decides whether to halt.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable failure codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    EventNotFound,
    NotInGroup,
    PermissionDenied,
    InvalidManualCheckin,
    EventEnded,
    QrInvalid,
    QrMismatch,
    QrInstanceMismatch,
    LocationRequired,
    EventLocationNotSet,
    InvalidLocation,
    OutOfRange,
    AlreadyCheckedIn,
    AlreadyCheckedOut,
    AttendanceNotFound,
    AttendanceDeleted,
    /// A write reported success but returned no row.
    NoData,
    /// Store-level error unrelated to the uniqueness constraint, surfaced
    /// opaquely and never retried by the engine.
    StoreUnavailable,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCode::EventNotFound => "EVENT_NOT_FOUND",
            FailureCode::NotInGroup => "NOT_IN_GROUP",
            FailureCode::PermissionDenied => "PERMISSION_DENIED",
            FailureCode::InvalidManualCheckin => "INVALID_MANUAL_CHECKIN",
            FailureCode::EventEnded => "EVENT_ENDED",
            FailureCode::QrInvalid => "QR_INVALID",
            FailureCode::QrMismatch => "QR_MISMATCH",
            FailureCode::QrInstanceMismatch => "QR_INSTANCE_MISMATCH",
            FailureCode::LocationRequired => "LOCATION_REQUIRED",
            FailureCode::EventLocationNotSet => "EVENT_LOCATION_NOT_SET",
            FailureCode::InvalidLocation => "INVALID_LOCATION",
            FailureCode::OutOfRange => "OUT_OF_RANGE",
            FailureCode::AlreadyCheckedIn => "ALREADY_CHECKED_IN",
            FailureCode::AlreadyCheckedOut => "ALREADY_CHECKED_OUT",
            FailureCode::AttendanceNotFound => "ATTENDANCE_NOT_FOUND",
            FailureCode::AttendanceDeleted => "ATTENDANCE_DELETED",
            FailureCode::NoData => "NO_DATA",
            FailureCode::StoreUnavailable => "STORE_UNAVAILABLE",
        }
    }
}

impl std::fmt::Display for FailureCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged engine failure: stable code plus message.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct CheckInFailure {
    pub code: FailureCode,
    pub message: String,
}

impl CheckInFailure {
    pub fn new(code: FailureCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Result alias threaded through every engine stage.
pub type Outcome<T> = Result<T, CheckInFailure>;
