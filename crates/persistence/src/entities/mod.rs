//! Database entity definitions (row mappings).

pub mod attendance_record;
pub mod event;
pub mod roster;

pub use attendance_record::AttendanceRecordEntity;
pub use event::EventEntity;
pub use roster::{AttendanceGroupEntity, TeamMemberEntity};
