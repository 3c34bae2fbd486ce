//! Non-blocking fraud-signal cross-checks.
//!
//! Secondary signals annotate the record; they never reject a check-in.
//! A store failure during flagging is logged and the check-in proceeds
//! unflagged.

use tracing::warn;

use crate::models::event::CheckInMethod;
use crate::services::occurrence::ResolvedOccurrence;
use crate::services::store::AttendanceStore;

/// Multiplier over the configured radius beyond which a token check-in's
/// reported coordinates count as disagreeing with the scan.
const GPS_MISMATCH_FACTOR: f64 = 1.2;

/// Suspect annotation for one check-in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegritySignals {
    pub suspect: bool,
    pub reason: Option<String>,
}

impl IntegritySignals {
    fn flag(&mut self, reason: &str) {
        self.suspect = true;
        self.reason = Some(match self.reason.take() {
            Some(existing) => format!("{}; {}", existing, reason),
            None => reason.to_string(),
        });
    }
}

/// Evaluates secondary integrity signals for a non-override check-in.
///
/// Device-identity collision: another live record on the same occurrence
/// sharing the device hash under a different participant. Token/GPS
/// disagreement: a token check-in whose reported coordinates are beyond
/// 1.2x the radius. Both may co-occur; reasons compose.
pub async fn evaluate(
    store: &dyn AttendanceStore,
    occurrence: &ResolvedOccurrence,
    participant_id: &str,
    device_hash: Option<&str>,
    method: CheckInMethod,
    distance_from_event_m: Option<f64>,
    radius_m: f64,
) -> IntegritySignals {
    let mut signals = IntegritySignals::default();

    if let Some(hash) = device_hash {
        match store
            .find_live_for_occurrence(&occurrence.event.id, occurrence.occurrence_date)
            .await
        {
            Ok(records) => {
                let collision = records.iter().any(|r| {
                    r.participant_id != participant_id && r.device_hash.as_deref() == Some(hash)
                });
                if collision {
                    signals.flag("device fingerprint conflict");
                }
            }
            Err(err) => {
                warn!(
                    event_id = %occurrence.event.id,
                    error = %err,
                    "Device collision check failed; proceeding unflagged"
                );
            }
        }
    }

    if method == CheckInMethod::Token {
        if let Some(distance) = distance_from_event_m {
            if distance.is_finite() && distance > radius_m * GPS_MISMATCH_FACTOR {
                signals.flag("GPS mismatch");
            }
        }
    }

    signals
}
