//! Storage capability seams consumed by the check-in engine.
//!
//! The engine never talks to the database directly; it consumes these
//! traits, implemented by the persistence crate in production and by
//! in-memory doubles in tests. The store's single-row uniqueness
//! constraint on (event, occurrence, participant) is the engine's sole
//! concurrency primitive, surfaced here as `StoreError::UniqueViolation`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::attendance::{AttendanceRecord, NewAttendanceRecord};
use crate::models::event::Event;
use crate::models::group::TeamRole;

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The uniqueness constraint on (event, occurrence, participant)
    /// rejected an insert.
    #[error("Unique constraint violated")]
    UniqueViolation,

    /// Any other store-level failure, surfaced opaquely and never
    /// retried by the engine.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Event lookup.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, StoreError>;
}

/// Attendance record persistence.
///
/// "Live" means not soft-deleted. Hard deletion exists only for the
/// legacy null-occurrence repair.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Live record for an exact occurrence key, if any.
    async fn find_live(
        &self,
        event_id: &str,
        occurrence_date: Option<NaiveDate>,
        participant_id: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Record for an exact occurrence key including soft-deleted rows.
    async fn find_record(
        &self,
        event_id: &str,
        occurrence_date: Option<NaiveDate>,
        participant_id: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// All live records a participant holds for an event, across
    /// occurrences. Used to reconcile a uniqueness conflict.
    async fn find_live_for_event_participant(
        &self,
        event_id: &str,
        participant_id: &str,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// All live records for one occurrence.
    async fn find_live_for_occurrence(
        &self,
        event_id: &str,
        occurrence_date: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Inserts a new record; `StoreError::UniqueViolation` signals a
    /// concurrent writer won the occurrence key.
    async fn insert(&self, record: NewAttendanceRecord) -> Result<AttendanceRecord, StoreError>;

    /// Updates status fields in place (repeat override). Returns `None`
    /// when the row vanished under us.
    async fn update_status(
        &self,
        record_id: Uuid,
        status: &str,
        late: bool,
        late_minutes: Option<i64>,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Sets the check-out instant. Returns `None` when the row vanished.
    async fn set_checked_out(
        &self,
        record_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Hard-deletes one row. Legacy null-occurrence repair only.
    async fn hard_delete(&self, record_id: Uuid) -> Result<(), StoreError>;
}

/// Group membership and team-role lookup.
#[async_trait]
pub trait RosterStore: Send + Sync {
    /// Names of the given groups, for the NOT_IN_GROUP message.
    async fn group_names(&self, group_ids: &[String]) -> Result<Vec<String>, StoreError>;

    /// Whether the participant belongs to at least one of the groups.
    async fn is_member_of_any(
        &self,
        participant_id: &str,
        group_ids: &[String],
    ) -> Result<bool, StoreError>;

    /// Primary per-team role lookup.
    async fn team_role(
        &self,
        team_id: &str,
        participant_id: &str,
    ) -> Result<Option<TeamRole>, StoreError>;

    /// Coarser team-membership manager flag, used when no per-team role
    /// row exists.
    async fn is_team_manager(
        &self,
        team_id: &str,
        participant_id: &str,
    ) -> Result<bool, StoreError>;
}
