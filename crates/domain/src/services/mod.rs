//! Check-in engine services.
//!
//! Each module is one stage of the check-in pipeline:
//! resolve → authorize → validate → classify/flag → record.

pub mod authorization;
pub mod checkin;
pub mod credential;
pub mod integrity;
pub mod occurrence;
pub mod status;
pub mod store;

pub use checkin::{CheckInConfig, CheckInService};
pub use occurrence::{OccurrenceRef, ResolvedOccurrence};
pub use store::{AttendanceStore, EventStore, RosterStore, StoreError};
