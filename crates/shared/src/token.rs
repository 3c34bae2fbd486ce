//! Scan-token codec for check-in credentials.
//!
//! A scan token is an opaque, transportable string carrying the event
//! binding for one occurrence: a base64url JSON payload plus an
//! HMAC-SHA256 tag under a deployment-wide secret. The codec is stateless;
//! validity is a pure function of the payload fields and the current time.
//! Binding the token to a *resolved* occurrence is the credential
//! validator's job, not the codec's.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::crypto::random_nonce;

type HmacSha256 = Hmac<Sha256>;

/// Nonce length in bytes for issued tokens.
const NONCE_BYTES: usize = 16;

/// Error type for scan-token operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token is missing an expiry")]
    MissingExpiry,

    #[error("Token has expired")]
    Expired,

    #[error("Failed to encode token: {0}")]
    Encoding(String),
}

/// Decoded scan-token payload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScanToken {
    pub event_id: String,
    pub team_id: String,
    pub expires_at: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
    pub nonce: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_date: Option<NaiveDate>,
}

/// Wire shape of the payload; expiry and issuance are optional here so
/// that verification can fail closed with a precise reason.
#[derive(Debug, Deserialize)]
struct RawPayload {
    event_id: String,
    team_id: String,
    expires_at: Option<DateTime<Utc>>,
    issued_at: Option<DateTime<Utc>>,
    nonce: Option<String>,
    #[serde(default)]
    instance_date: Option<NaiveDate>,
}

/// Encoder/decoder for scan tokens, keyed by a deployment-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    key: Vec<u8>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    /// Issues a token binding the given event (and occurrence date, for
    /// recurring events) until `expires_at`, with a fresh random nonce.
    pub fn issue(
        &self,
        event_id: &str,
        team_id: &str,
        expires_at: DateTime<Utc>,
        instance_date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let payload = ScanToken {
            event_id: event_id.to_string(),
            team_id: team_id.to_string(),
            expires_at,
            issued_at: now,
            nonce: random_nonce(NONCE_BYTES),
            instance_date,
        };

        let json = serde_json::to_vec(&payload).map_err(|e| TokenError::Encoding(e.to_string()))?;
        let body = URL_SAFE_NO_PAD.encode(&json);
        let tag = self.sign(body.as_bytes())?;
        Ok(format!("{}.{}", body, tag))
    }

    /// Decodes and verifies a token against the current time.
    ///
    /// Fails closed: malformed encoding, a bad signature, a missing
    /// expiry, or an expiry in the past all reject the token.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<ScanToken, TokenError> {
        let (body, tag) = token.split_once('.').ok_or(TokenError::Malformed)?;

        let tag_bytes = URL_SAFE_NO_PAD
            .decode(tag)
            .map_err(|_| TokenError::Malformed)?;
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;
        mac.update(body.as_bytes());
        // Constant-time tag comparison.
        mac.verify_slice(&tag_bytes)
            .map_err(|_| TokenError::InvalidSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|_| TokenError::Malformed)?;
        let raw: RawPayload = serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        let expires_at = raw.expires_at.ok_or(TokenError::MissingExpiry)?;
        if expires_at <= now {
            return Err(TokenError::Expired);
        }

        Ok(ScanToken {
            event_id: raw.event_id,
            team_id: raw.team_id,
            expires_at,
            issued_at: raw.issued_at.unwrap_or(expires_at),
            nonce: raw.nonce.unwrap_or_default(),
            instance_date: raw.instance_date,
        })
    }

    fn sign(&self, body: &[u8]) -> Result<String, TokenError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;
        mac.update(body);
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn codec() -> TokenCodec {
        TokenCodec::new("test_scan_token_secret_12345")
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_issue_then_verify_round_trip() {
        let codec = codec();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10);
        let token = codec
            .issue("E1", "T1", now() + Duration::minutes(30), date, now())
            .unwrap();

        let decoded = codec.verify(&token, now()).unwrap();
        assert_eq!(decoded.event_id, "E1");
        assert_eq!(decoded.team_id, "T1");
        assert_eq!(decoded.instance_date, date);
        assert_eq!(decoded.issued_at, now());
        assert!(!decoded.nonce.is_empty());
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec();
        let token = codec
            .issue("E1", "T1", now() - Duration::minutes(1), None, now() - Duration::hours(1))
            .unwrap();

        assert_eq!(codec.verify(&token, now()), Err(TokenError::Expired));
    }

    #[test]
    fn test_expiry_exactly_now_rejected() {
        let codec = codec();
        let token = codec
            .issue("E1", "T1", now(), None, now() - Duration::minutes(5))
            .unwrap();

        assert_eq!(codec.verify(&token, now()), Err(TokenError::Expired));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let codec = codec();
        assert_eq!(codec.verify("not-a-token", now()), Err(TokenError::Malformed));
        assert_eq!(codec.verify("", now()), Err(TokenError::Malformed));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = codec();
        let token = codec
            .issue("E1", "T1", now() + Duration::minutes(30), None, now())
            .unwrap();
        let (_, tag) = token.split_once('.').unwrap();
        let forged_body = URL_SAFE_NO_PAD.encode(
            br#"{"event_id":"E2","team_id":"T1","expires_at":"2099-01-01T00:00:00Z"}"#,
        );
        let forged = format!("{}.{}", forged_body, tag);

        assert_eq!(codec.verify(&forged, now()), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_bit_flipped_tag_rejected() {
        let codec = codec();
        let token = codec
            .issue("E1", "T1", now() + Duration::minutes(30), None, now())
            .unwrap();
        let (body, tag) = token.split_once('.').unwrap();
        let mut tag_bytes = URL_SAFE_NO_PAD.decode(tag).unwrap();
        tag_bytes[0] ^= 0x01;
        let forged = format!("{}.{}", body, URL_SAFE_NO_PAD.encode(tag_bytes));

        assert_eq!(codec.verify(&forged, now()), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbled_tag_rejected() {
        let codec = codec();
        let token = codec
            .issue("E1", "T1", now() + Duration::minutes(30), None, now())
            .unwrap();
        let (body, _) = token.split_once('.').unwrap();

        assert_eq!(
            codec.verify(&format!("{}.!!!", body), now()),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = codec()
            .issue("E1", "T1", now() + Duration::minutes(30), None, now())
            .unwrap();
        let other = TokenCodec::new("another_secret");

        assert_eq!(other.verify(&token, now()), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_missing_expiry_rejected() {
        let codec = codec();
        let body = URL_SAFE_NO_PAD.encode(br#"{"event_id":"E1","team_id":"T1"}"#);
        let tag = codec.sign(body.as_bytes()).unwrap();
        let token = format!("{}.{}", body, tag);

        assert_eq!(codec.verify(&token, now()), Err(TokenError::MissingExpiry));
    }

    #[test]
    fn test_nonce_differs_per_issue() {
        let codec = codec();
        let a = codec
            .issue("E1", "T1", now() + Duration::minutes(30), None, now())
            .unwrap();
        let b = codec
            .issue("E1", "T1", now() + Duration::minutes(30), None, now())
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_instance_date_absent_for_non_recurring() {
        let codec = codec();
        let token = codec
            .issue("E1", "T1", now() + Duration::minutes(30), None, now())
            .unwrap();
        let decoded = codec.verify(&token, now()).unwrap();
        assert_eq!(decoded.instance_date, None);
    }
}
