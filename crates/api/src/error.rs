use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use domain::outcome::{CheckInFailure, FailureCode};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{}: {}", .0.code, .0.message)]
    CheckIn(CheckInFailure),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

/// HTTP status for a tagged engine failure code.
fn failure_status(code: FailureCode) -> StatusCode {
    match code {
        FailureCode::EventNotFound
        | FailureCode::AttendanceNotFound
        | FailureCode::NoData => StatusCode::NOT_FOUND,
        FailureCode::NotInGroup | FailureCode::PermissionDenied => StatusCode::FORBIDDEN,
        FailureCode::AlreadyCheckedIn
        | FailureCode::AlreadyCheckedOut
        | FailureCode::EventEnded => StatusCode::CONFLICT,
        FailureCode::AttendanceDeleted => StatusCode::GONE,
        FailureCode::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        FailureCode::InvalidManualCheckin
        | FailureCode::QrInvalid
        | FailureCode::QrMismatch
        | FailureCode::QrInstanceMismatch
        | FailureCode::LocationRequired
        | FailureCode::EventLocationNotSet
        | FailureCode::InvalidLocation
        | FailureCode::OutOfRange => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED".to_string(), msg)
            }
            ApiError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR".to_string(), msg)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND".to_string(), msg),
            ApiError::CheckIn(failure) => {
                if failure.code == FailureCode::StoreUnavailable {
                    tracing::error!("Store unavailable: {}", failure.message);
                }
                (
                    failure_status(failure.code),
                    failure.code.as_str().to_string(),
                    failure.message,
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR".to_string(),
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code,
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<CheckInFailure> for ApiError {
    fn from(failure: CheckInFailure) -> Self {
        ApiError::CheckIn(failure)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let detail = e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "invalid value".to_string());
                    format!("{}: {}", field, detail)
                })
            })
            .collect();
        ApiError::Validation(messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_status() {
        let response = ApiError::Unauthorized("missing identity".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_validation_status() {
        let response = ApiError::Validation("bad latitude".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_engine_failure_statuses() {
        assert_eq!(
            failure_status(FailureCode::EventNotFound),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            failure_status(FailureCode::PermissionDenied),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            failure_status(FailureCode::AlreadyCheckedIn),
            StatusCode::CONFLICT
        );
        assert_eq!(
            failure_status(FailureCode::AttendanceDeleted),
            StatusCode::GONE
        );
        assert_eq!(
            failure_status(FailureCode::OutOfRange),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            failure_status(FailureCode::StoreUnavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_engine_failure_keeps_code_in_body() {
        let failure = CheckInFailure::new(FailureCode::OutOfRange, "too far");
        let error: ApiError = failure.into();
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: ApiError = sqlx::Error::RowNotFound.into();
        match error {
            ApiError::NotFound(msg) => assert_eq!(msg, "Resource not found"),
            _ => panic!("Expected NotFound error"),
        }
    }
}
