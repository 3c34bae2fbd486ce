//! Status classification for check-ins.

use chrono::{DateTime, Utc};

use crate::models::attendance::AttendanceStatus;

/// Derived status fields for one check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: String,
    pub late: bool,
    pub late_minutes: Option<i64>,
}

/// Buckets a check-in into on-time/late categories.
///
/// An explicit override status is used verbatim; lateness is then
/// inferred from whether the label text contains "late". Otherwise the
/// bucket is derived from whole minutes elapsed since occurrence start:
/// <=0 present, (0,10] late_10, (10,30] late_30, >30 very_late.
pub fn classify(
    now: DateTime<Utc>,
    occurrence_start: DateTime<Utc>,
    override_status: Option<&str>,
) -> Classification {
    if let Some(label) = override_status {
        return Classification {
            status: label.to_string(),
            late: label.to_lowercase().contains("late"),
            late_minutes: None,
        };
    }

    let delta_minutes = (now - occurrence_start).num_seconds().div_euclid(60);

    let status = if delta_minutes <= 0 {
        AttendanceStatus::Present
    } else if delta_minutes <= 10 {
        AttendanceStatus::Late10
    } else if delta_minutes <= 30 {
        AttendanceStatus::Late30
    } else {
        AttendanceStatus::VeryLate
    };

    Classification {
        status: status.as_str().to_string(),
        late: status != AttendanceStatus::Present,
        late_minutes: (delta_minutes > 0).then_some(delta_minutes),
    }
}
