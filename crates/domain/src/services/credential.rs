//! Method-specific credential validation.
//!
//! Token check-ins must present a verifiable scan token bound to the
//! resolved occurrence; geolocation check-ins must fall inside the
//! event's radius; overrides carry no credential and may be retroactive.
//! The admission time window applies to the non-override methods only.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use shared::geo::haversine_distance_m;
use shared::token::{ScanToken, TokenCodec, TokenError};

use crate::models::event::Event;
use crate::outcome::{CheckInFailure, FailureCode, Outcome};
use crate::services::occurrence::ResolvedOccurrence;

/// Default check-in radius in meters when the event does not set one.
pub const DEFAULT_RADIUS_M: f64 = 100.0;

/// Fixed grace period after occurrence end during which self-service
/// check-in remains admissible.
pub const DEFAULT_GRACE_MINUTES: i64 = 15;

/// TTL-bounded cache of verified token payloads, owned by the service
/// that constructs it. Avoids re-verifying the same opaque string for
/// bursts of retries from one device.
pub struct TokenCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (ScanToken, Instant)>>,
}

impl TokenCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn get(&self, opaque: &str) -> Option<ScanToken> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(opaque) {
            Some((payload, inserted)) if inserted.elapsed() < self.ttl => Some(payload.clone()),
            Some(_) => {
                entries.remove(opaque);
                None
            }
            None => None,
        }
    }

    fn put(&self, opaque: &str, payload: ScanToken) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(opaque.to_string(), (payload, Instant::now()));
        }
    }
}

/// Method-specific admission checks for one check-in attempt.
pub struct CredentialValidator {
    codec: TokenCodec,
    cache: TokenCache,
    default_radius_m: f64,
    grace: chrono::Duration,
}

impl CredentialValidator {
    pub fn new(
        codec: TokenCodec,
        cache_ttl: Duration,
        default_radius_m: f64,
        grace_minutes: i64,
    ) -> Self {
        Self {
            codec,
            cache: TokenCache::new(cache_ttl),
            default_radius_m,
            grace: chrono::Duration::minutes(grace_minutes),
        }
    }

    /// Effective check-in radius for an event.
    pub fn radius_for(&self, event: &Event) -> f64 {
        event
            .location
            .and_then(|l| l.radius_m)
            .unwrap_or(self.default_radius_m)
    }

    /// Non-override admission window: occurrence start until end plus
    /// the grace period. Only the trailing bound rejects; early
    /// check-ins classify as present.
    pub fn check_time_window(
        &self,
        occurrence: &ResolvedOccurrence,
        now: DateTime<Utc>,
    ) -> Outcome<()> {
        if now > occurrence.ends_at + self.grace {
            return Err(CheckInFailure::new(
                FailureCode::EventEnded,
                "Check-in window has closed for this occurrence",
            ));
        }
        Ok(())
    }

    /// Verifies a scan token and its binding to the resolved occurrence.
    pub fn validate_token(
        &self,
        occurrence: &ResolvedOccurrence,
        opaque: &str,
        now: DateTime<Utc>,
    ) -> Outcome<ScanToken> {
        let payload = match self.cache.get(opaque) {
            Some(payload) if payload.expires_at > now => payload,
            _ => {
                let payload = self.codec.verify(opaque, now).map_err(token_failure)?;
                self.cache.put(opaque, payload.clone());
                payload
            }
        };

        if payload.event_id != occurrence.event.id || payload.team_id != occurrence.event.team_id {
            return Err(CheckInFailure::new(
                FailureCode::QrMismatch,
                "Token was issued for a different event",
            ));
        }

        // Exact occurrence binding, including both-absent for
        // non-recurring events.
        if payload.instance_date != occurrence.occurrence_date {
            return Err(CheckInFailure::new(
                FailureCode::QrInstanceMismatch,
                "Token was issued for a different occurrence",
            ));
        }

        Ok(payload)
    }

    /// Verifies caller proximity to the event location. Returns the
    /// computed distance in meters.
    pub fn validate_geolocation(
        &self,
        occurrence: &ResolvedOccurrence,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Outcome<f64> {
        let (lat, lon) = match (latitude, longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                return Err(CheckInFailure::new(
                    FailureCode::LocationRequired,
                    "Geolocation check-in requires caller coordinates",
                ))
            }
        };

        let location = occurrence.event.location.ok_or_else(|| {
            CheckInFailure::new(
                FailureCode::EventLocationNotSet,
                "Event has no check-in location configured",
            )
        })?;

        let distance = haversine_distance_m(lat, lon, location.latitude, location.longitude);
        if !distance.is_finite() {
            return Err(CheckInFailure::new(
                FailureCode::InvalidLocation,
                "Caller coordinates are not valid",
            ));
        }

        let radius = self.radius_for(&occurrence.event);
        if distance > radius {
            return Err(CheckInFailure::new(
                FailureCode::OutOfRange,
                format!(
                    "Caller is {:.0}m from the event (allowed {:.0}m)",
                    distance, radius
                ),
            ));
        }

        Ok(distance)
    }
}

fn token_failure(err: TokenError) -> CheckInFailure {
    let message = match err {
        TokenError::Expired => "Token has expired".to_string(),
        other => other.to_string(),
    };
    CheckInFailure::new(FailureCode::QrInvalid, message)
}
