//! Attendance record entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::attendance::AttendanceRecord;
use domain::models::event::CheckInMethod;

/// Database row mapping for the attendance_records table.
#[derive(Debug, Clone, FromRow)]
pub struct AttendanceRecordEntity {
    pub id: Uuid,
    pub event_id: String,
    pub occurrence_date: Option<NaiveDate>,
    pub participant_id: String,
    pub team_id: String,
    pub method: String,
    pub checked_in_at: DateTime<Utc>,
    pub status: String,
    pub late: bool,
    pub late_minutes: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_from_event_m: Option<f64>,
    pub device_hash: Option<String>,
    pub suspect: bool,
    pub suspect_reason: Option<String>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub deleted: bool,
    pub deleted_by: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<AttendanceRecordEntity> for AttendanceRecord {
    fn from(entity: AttendanceRecordEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            occurrence_date: entity.occurrence_date,
            participant_id: entity.participant_id,
            team_id: entity.team_id,
            // A row written by an older schema revision may carry an
            // unknown method label; it is read back as an override.
            method: CheckInMethod::from_str(&entity.method).unwrap_or(CheckInMethod::Override),
            checked_in_at: entity.checked_in_at,
            status: entity.status,
            late: entity.late,
            late_minutes: entity.late_minutes,
            latitude: entity.latitude,
            longitude: entity.longitude,
            distance_from_event_m: entity.distance_from_event_m,
            device_hash: entity.device_hash,
            suspect: entity.suspect,
            suspect_reason: entity.suspect_reason,
            checked_out_at: entity.checked_out_at,
            deleted: entity.deleted,
            deleted_by: entity.deleted_by,
            deleted_at: entity.deleted_at,
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entity() -> AttendanceRecordEntity {
        AttendanceRecordEntity {
            id: Uuid::new_v4(),
            event_id: "E1".to_string(),
            occurrence_date: NaiveDate::from_ymd_opt(2025, 9, 1),
            participant_id: "P1".to_string(),
            team_id: "T1".to_string(),
            method: "token".to_string(),
            checked_in_at: Utc.with_ymd_and_hms(2025, 9, 1, 15, 5, 0).unwrap(),
            status: "late_10".to_string(),
            late: true,
            late_minutes: Some(5),
            latitude: None,
            longitude: None,
            distance_from_event_m: None,
            device_hash: Some("abc123".to_string()),
            suspect: false,
            suspect_reason: None,
            checked_out_at: None,
            deleted: false,
            deleted_by: None,
            deleted_at: None,
            created_at: Utc.with_ymd_and_hms(2025, 9, 1, 15, 5, 0).unwrap(),
        }
    }

    #[test]
    fn test_into_domain_record() {
        let record: AttendanceRecord = entity().into();
        assert_eq!(record.method, CheckInMethod::Token);
        assert_eq!(record.status, "late_10");
        assert_eq!(record.late_minutes, Some(5));
    }

    #[test]
    fn test_unknown_method_reads_as_override() {
        let mut e = entity();
        e.method = "kiosk".to_string();
        let record: AttendanceRecord = e.into();
        assert_eq!(record.method, CheckInMethod::Override);
    }
}
