//! Check-in orchestration and conflict-safe recording.
//!
//! One call is a short synchronous pipeline: resolve the occurrence,
//! authorize, run the method-specific credential check, classify and
//! flag, then perform the single durable write. The store's uniqueness
//! constraint on (event, occurrence, participant) is the only
//! concurrency primitive; the recorder retries at most once, and only
//! to repair a known legacy data shape.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use shared::clock::Clock;
use shared::token::TokenCodec;
use tracing::info;

use crate::models::attendance::{AttendanceRecord, CheckInRequest, CheckOutRequest, NewAttendanceRecord};
use crate::models::event::CheckInMethod;
use crate::outcome::{CheckInFailure, FailureCode, Outcome};
use crate::services::authorization::{is_marker, store_failure, AuthorizationGate};
use crate::services::credential::{CredentialValidator, DEFAULT_GRACE_MINUTES, DEFAULT_RADIUS_M};
use crate::services::integrity::{self, IntegritySignals};
use crate::services::occurrence::{resolve, OccurrenceRef, ResolvedOccurrence};
use crate::services::status::{classify, Classification};
use crate::services::store::{AttendanceStore, EventStore, RosterStore, StoreError};

/// Tunables for the check-in engine.
#[derive(Debug, Clone)]
pub struct CheckInConfig {
    pub default_radius_m: f64,
    pub grace_minutes: i64,
    pub credential_cache_ttl_secs: u64,
    /// How long an issued scan token outlives its occurrence window.
    pub scan_token_slack_minutes: i64,
}

impl Default for CheckInConfig {
    fn default() -> Self {
        Self {
            default_radius_m: DEFAULT_RADIUS_M,
            grace_minutes: DEFAULT_GRACE_MINUTES,
            credential_cache_ttl_secs: 60,
            scan_token_slack_minutes: 0,
        }
    }
}

/// Outcome of reconciling a uniqueness conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// A live record already owns this occurrence key; the other writer won.
    OccurrenceTaken,
    /// A legacy null-occurrence row was deleted; the insert may be
    /// retried exactly once.
    LegacyRowRepaired,
}

/// The check-in engine.
pub struct CheckInService {
    events: Arc<dyn EventStore>,
    attendance: Arc<dyn AttendanceStore>,
    roster: Arc<dyn RosterStore>,
    clock: Arc<dyn Clock>,
    codec: TokenCodec,
    validator: CredentialValidator,
    config: CheckInConfig,
}

impl CheckInService {
    pub fn new(
        events: Arc<dyn EventStore>,
        attendance: Arc<dyn AttendanceStore>,
        roster: Arc<dyn RosterStore>,
        clock: Arc<dyn Clock>,
        codec: TokenCodec,
        config: CheckInConfig,
    ) -> Self {
        let validator = CredentialValidator::new(
            codec.clone(),
            Duration::from_secs(config.credential_cache_ttl_secs),
            config.default_radius_m,
            config.grace_minutes,
        );
        Self {
            events,
            attendance,
            roster,
            clock,
            codec,
            validator,
            config,
        }
    }

    /// Marks attendance for one occurrence.
    pub async fn check_in(
        &self,
        caller_id: &str,
        request: &CheckInRequest,
    ) -> Outcome<AttendanceRecord> {
        let occurrence = self
            .resolve_reference(&request.occurrence_ref, request.occurrence_date)
            .await?;

        let target_id = match request.method {
            CheckInMethod::Override => request
                .override_target_participant
                .as_deref()
                .unwrap_or(caller_id),
            _ => caller_id,
        };

        let carries_coordinates = request.latitude.is_some() || request.longitude.is_some();
        AuthorizationGate::new(self.roster.as_ref())
            .authorize(
                &occurrence.event,
                caller_id,
                target_id,
                request.method,
                carries_coordinates,
            )
            .await?;

        let now = self.clock.now();
        let mut distance_from_event_m = None;

        match request.method {
            CheckInMethod::Override => {}
            CheckInMethod::Token => {
                self.validator.check_time_window(&occurrence, now)?;
                let opaque = request.token.as_deref().ok_or_else(|| {
                    CheckInFailure::new(FailureCode::QrInvalid, "Check-in token is missing")
                })?;
                self.validator.validate_token(&occurrence, opaque, now)?;
                distance_from_event_m = self.reported_distance(&occurrence, request);
            }
            CheckInMethod::Geolocation => {
                self.validator.check_time_window(&occurrence, now)?;
                let distance = self.validator.validate_geolocation(
                    &occurrence,
                    request.latitude,
                    request.longitude,
                )?;
                distance_from_event_m = Some(distance);
            }
        }

        let override_status = match request.method {
            CheckInMethod::Override => request.override_status.as_deref(),
            _ => None,
        };
        let classification = classify(now, occurrence.starts_at, override_status);

        // Device identity is forbidden on overrides; the flagger only
        // runs for self-service methods.
        let (device_hash, signals) = match request.method {
            CheckInMethod::Override => (None, IntegritySignals::default()),
            _ => {
                let hash = request.device_identity_hash.clone();
                let signals = integrity::evaluate(
                    self.attendance.as_ref(),
                    &occurrence,
                    target_id,
                    hash.as_deref(),
                    request.method,
                    distance_from_event_m,
                    self.validator.radius_for(&occurrence.event),
                )
                .await;
                (hash, signals)
            }
        };

        let record = NewAttendanceRecord {
            event_id: occurrence.event.id.clone(),
            occurrence_date: occurrence.occurrence_date,
            participant_id: target_id.to_string(),
            team_id: occurrence.event.team_id.clone(),
            method: request.method,
            checked_in_at: now,
            status: classification.status.clone(),
            late: classification.late,
            late_minutes: classification.late_minutes,
            latitude: request.latitude,
            longitude: request.longitude,
            distance_from_event_m,
            device_hash,
            suspect: signals.suspect,
            suspect_reason: signals.reason,
        };

        let stored = self
            .record(record, request.method, override_status.is_some(), &classification)
            .await?;

        info!(
            event_id = %stored.event_id,
            participant_id = %stored.participant_id,
            method = stored.method.as_str(),
            status = %stored.status,
            suspect = stored.suspect,
            "Attendance recorded"
        );
        Ok(stored)
    }

    /// Sets the check-out instant on an existing live record.
    pub async fn check_out(
        &self,
        caller_id: &str,
        request: &CheckOutRequest,
    ) -> Outcome<AttendanceRecord> {
        let occurrence = self.resolve_reference(&request.occurrence_ref, None).await?;

        let record = self
            .attendance
            .find_record(
                &occurrence.event.id,
                occurrence.occurrence_date,
                caller_id,
            )
            .await
            .map_err(store_failure)?
            .ok_or_else(|| {
                CheckInFailure::new(
                    FailureCode::AttendanceNotFound,
                    "No attendance record for this occurrence",
                )
            })?;

        if record.deleted {
            return Err(CheckInFailure::new(
                FailureCode::AttendanceDeleted,
                "Attendance record was deleted",
            ));
        }
        if record.checked_out_at.is_some() {
            return Err(CheckInFailure::new(
                FailureCode::AlreadyCheckedOut,
                "Already checked out of this occurrence",
            ));
        }

        self.attendance
            .set_checked_out(record.id, self.clock.now())
            .await
            .map_err(store_failure)?
            .ok_or_else(|| {
                CheckInFailure::new(FailureCode::NoData, "Check-out returned no row")
            })
    }

    /// Issues a scan token for one occurrence; role-gated the same way
    /// as delegated marking.
    pub async fn issue_scan_token(
        &self,
        caller_id: &str,
        occurrence_ref: &str,
        explicit_date: Option<NaiveDate>,
    ) -> Outcome<String> {
        let occurrence = self.resolve_reference(occurrence_ref, explicit_date).await?;

        let qualified = is_marker(self.roster.as_ref(), &occurrence.event.team_id, caller_id)
            .await
            .map_err(store_failure)?;
        if !qualified {
            return Err(CheckInFailure::new(
                FailureCode::PermissionDenied,
                "Caller is not allowed to issue check-in tokens",
            ));
        }

        let now = self.clock.now();
        let expires_at = occurrence.ends_at
            + chrono::Duration::minutes(
                self.config.grace_minutes + self.config.scan_token_slack_minutes,
            );
        self.codec
            .issue(
                &occurrence.event.id,
                &occurrence.event.team_id,
                expires_at,
                occurrence.occurrence_date,
                now,
            )
            .map_err(|e| CheckInFailure::new(FailureCode::StoreUnavailable, e.to_string()))
    }

    async fn resolve_reference(
        &self,
        occurrence_ref: &str,
        explicit_date: Option<NaiveDate>,
    ) -> Outcome<ResolvedOccurrence> {
        let reference = OccurrenceRef::parse(occurrence_ref)?;
        let event = self
            .events
            .find_event(&reference.event_id)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| {
                CheckInFailure::new(
                    FailureCode::EventNotFound,
                    format!("Event {} not found", reference.event_id),
                )
            })?;
        resolve(event, &reference, explicit_date)
    }

    /// Distance a token check-in reports, when it volunteers
    /// coordinates and the event has a location. Non-finite distances
    /// are dropped.
    fn reported_distance(
        &self,
        occurrence: &ResolvedOccurrence,
        request: &CheckInRequest,
    ) -> Option<f64> {
        let location = occurrence.event.location?;
        let (lat, lon) = (request.latitude?, request.longitude?);
        let distance =
            shared::geo::haversine_distance_m(lat, lon, location.latitude, location.longitude);
        distance.is_finite().then_some(distance)
    }

    /// The durable-write state machine:
    /// NoRecord -> Inserted, or Conflict -> Reconciled -> Inserted, or
    /// UpdatedInPlace for a repeat override with an explicit status.
    async fn record(
        &self,
        record: NewAttendanceRecord,
        method: CheckInMethod,
        has_explicit_status: bool,
        classification: &Classification,
    ) -> Outcome<AttendanceRecord> {
        let existing = self
            .attendance
            .find_live(
                &record.event_id,
                record.occurrence_date,
                &record.participant_id,
            )
            .await
            .map_err(store_failure)?;

        if let Some(existing) = existing {
            if method == CheckInMethod::Override && has_explicit_status {
                // Idempotent edit: a repeat override re-marks in place.
                return self
                    .attendance
                    .update_status(
                        existing.id,
                        &classification.status,
                        classification.late,
                        classification.late_minutes,
                    )
                    .await
                    .map_err(store_failure)?
                    .ok_or_else(|| {
                        CheckInFailure::new(FailureCode::NoData, "Re-mark returned no row")
                    });
            }
            return Err(already_checked_in());
        }

        match self.attendance.insert(record.clone()).await {
            Ok(stored) => Ok(stored),
            Err(StoreError::UniqueViolation) => {
                match self
                    .reconcile_conflict(
                        &record.event_id,
                        record.occurrence_date,
                        &record.participant_id,
                    )
                    .await?
                {
                    ReconcileAction::OccurrenceTaken => Err(already_checked_in()),
                    ReconcileAction::LegacyRowRepaired => {
                        // Single retry; a second conflict is a genuine race.
                        match self.attendance.insert(record).await {
                            Ok(stored) => Ok(stored),
                            Err(StoreError::UniqueViolation) => Err(already_checked_in()),
                            Err(err) => Err(store_failure(err)),
                        }
                    }
                }
            }
            Err(err) => Err(store_failure(err)),
        }
    }

    /// Explains a uniqueness conflict after a failed insert.
    ///
    /// An exact occurrence-key match means a concurrent writer won. A
    /// live row with a null occurrence key on a now-recurring event is a
    /// migration artifact; it is hard-deleted so the insert can be
    /// retried. This repair step goes away once no legacy rows remain.
    pub async fn reconcile_conflict(
        &self,
        event_id: &str,
        occurrence_date: Option<NaiveDate>,
        participant_id: &str,
    ) -> Outcome<ReconcileAction> {
        let rows = self
            .attendance
            .find_live_for_event_participant(event_id, participant_id)
            .await
            .map_err(store_failure)?;

        if rows.iter().any(|r| r.occurrence_date == occurrence_date) {
            return Ok(ReconcileAction::OccurrenceTaken);
        }

        if occurrence_date.is_some() {
            if let Some(legacy) = rows.iter().find(|r| r.occurrence_date.is_none()) {
                self.attendance
                    .hard_delete(legacy.id)
                    .await
                    .map_err(store_failure)?;
                info!(
                    event_id = %event_id,
                    participant_id = %participant_id,
                    "Repaired legacy null-occurrence attendance row"
                );
                return Ok(ReconcileAction::LegacyRowRepaired);
            }
        }

        // Nothing matched the conflict; treat the other writer as the
        // winner rather than masking the race.
        Ok(ReconcileAction::OccurrenceTaken)
    }
}

fn already_checked_in() -> CheckInFailure {
    CheckInFailure::new(
        FailureCode::AlreadyCheckedIn,
        "Attendance already recorded for this occurrence",
    )
}
