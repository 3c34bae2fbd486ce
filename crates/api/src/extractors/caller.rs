//! Caller identity extractor.
//!
//! Identity is established upstream (gateway or mobile BFF) and passed
//! down as a trusted header. A request without it is rejected before
//! any handler runs.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// Header carrying the authenticated participant identifier.
pub const PARTICIPANT_HEADER: &str = "X-Participant-Id";

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub participant_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let participant_id = parts
            .headers
            .get(PARTICIPANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ApiError::Unauthorized(format!("Missing {} header", PARTICIPANT_HEADER))
            })?
            .to_string();

        Ok(Caller { participant_id })
    }
}
