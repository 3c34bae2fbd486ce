//! Repository implementations of the domain store traits.

pub mod attendance;
pub mod event;
pub mod roster;

pub use attendance::AttendanceRepository;
pub use event::EventRepository;
pub use roster::RosterRepository;

use domain::services::store::StoreError;

/// PostgreSQL unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// Maps a database error onto the store error the engine understands.
/// Only a unique-constraint rejection is distinguished; everything else
/// is opaque.
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::UniqueViolation;
        }
    }
    StoreError::Unavailable(err.to_string())
}
