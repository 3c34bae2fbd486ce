//! Attendance record repository for database operations.
//!
//! A partial unique index on (event_id, occurrence_date, participant_id)
//! over live rows is the concurrency primitive behind check-in; its
//! SQLSTATE 23505 rejection surfaces as `StoreError::UniqueViolation`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::attendance::{AttendanceRecord, NewAttendanceRecord};
use domain::services::store::{AttendanceStore, StoreError};

use crate::entities::AttendanceRecordEntity;
use crate::metrics::QueryTimer;
use crate::repositories::store_error;

/// Repository for attendance-record database operations.
#[derive(Clone)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    /// Creates a new AttendanceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a record by primary key, including soft-deleted rows.
    pub async fn find_by_id(
        &self,
        record_id: Uuid,
    ) -> Result<Option<AttendanceRecordEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_attendance_by_id");
        let result = sqlx::query_as::<_, AttendanceRecordEntity>(
            r#"
            SELECT * FROM attendance_records WHERE id = $1
            "#,
        )
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// All live records for one occurrence, newest check-in first.
    pub async fn list_for_occurrence(
        &self,
        event_id: &str,
        occurrence_date: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecordEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_attendance_for_occurrence");
        let result = sqlx::query_as::<_, AttendanceRecordEntity>(
            r#"
            SELECT * FROM attendance_records
            WHERE event_id = $1
              AND occurrence_date IS NOT DISTINCT FROM $2
              AND deleted = false
            ORDER BY checked_in_at DESC
            "#,
        )
        .bind(event_id)
        .bind(occurrence_date)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Soft-deletes a record, recording who removed it. Returns the
    /// updated row, or `None` if it does not exist or is already gone.
    pub async fn soft_delete(
        &self,
        record_id: Uuid,
        deleted_by: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<AttendanceRecordEntity>, sqlx::Error> {
        let timer = QueryTimer::new("soft_delete_attendance");
        let result = sqlx::query_as::<_, AttendanceRecordEntity>(
            r#"
            UPDATE attendance_records
            SET deleted = true, deleted_by = $2, deleted_at = $3
            WHERE id = $1 AND deleted = false
            RETURNING *
            "#,
        )
        .bind(record_id)
        .bind(deleted_by)
        .bind(at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[async_trait]
impl AttendanceStore for AttendanceRepository {
    async fn find_live(
        &self,
        event_id: &str,
        occurrence_date: Option<NaiveDate>,
        participant_id: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let timer = QueryTimer::new("find_live_attendance");
        let result = sqlx::query_as::<_, AttendanceRecordEntity>(
            r#"
            SELECT * FROM attendance_records
            WHERE event_id = $1
              AND occurrence_date IS NOT DISTINCT FROM $2
              AND participant_id = $3
              AND deleted = false
            "#,
        )
        .bind(event_id)
        .bind(occurrence_date)
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(store_error)?.map(AttendanceRecord::from))
    }

    async fn find_record(
        &self,
        event_id: &str,
        occurrence_date: Option<NaiveDate>,
        participant_id: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let timer = QueryTimer::new("find_attendance_record");
        let result = sqlx::query_as::<_, AttendanceRecordEntity>(
            r#"
            SELECT * FROM attendance_records
            WHERE event_id = $1
              AND occurrence_date IS NOT DISTINCT FROM $2
              AND participant_id = $3
            ORDER BY deleted ASC, checked_in_at DESC
            LIMIT 1
            "#,
        )
        .bind(event_id)
        .bind(occurrence_date)
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(store_error)?.map(AttendanceRecord::from))
    }

    async fn find_live_for_event_participant(
        &self,
        event_id: &str,
        participant_id: &str,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let timer = QueryTimer::new("find_live_attendance_for_participant");
        let result = sqlx::query_as::<_, AttendanceRecordEntity>(
            r#"
            SELECT * FROM attendance_records
            WHERE event_id = $1 AND participant_id = $2 AND deleted = false
            "#,
        )
        .bind(event_id)
        .bind(participant_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result
            .map_err(store_error)?
            .into_iter()
            .map(AttendanceRecord::from)
            .collect())
    }

    async fn find_live_for_occurrence(
        &self,
        event_id: &str,
        occurrence_date: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let entities = self
            .list_for_occurrence(event_id, occurrence_date)
            .await
            .map_err(store_error)?;
        Ok(entities.into_iter().map(AttendanceRecord::from).collect())
    }

    async fn insert(&self, record: NewAttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        let timer = QueryTimer::new("insert_attendance");
        let result = sqlx::query_as::<_, AttendanceRecordEntity>(
            r#"
            INSERT INTO attendance_records (
                event_id, occurrence_date, participant_id, team_id, method,
                checked_in_at, status, late, late_minutes,
                latitude, longitude, distance_from_event_m,
                device_hash, suspect, suspect_reason
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(&record.event_id)
        .bind(record.occurrence_date)
        .bind(&record.participant_id)
        .bind(&record.team_id)
        .bind(record.method.as_str())
        .bind(record.checked_in_at)
        .bind(&record.status)
        .bind(record.late)
        .bind(record.late_minutes)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(record.distance_from_event_m)
        .bind(&record.device_hash)
        .bind(record.suspect)
        .bind(&record.suspect_reason)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(store_error).map(AttendanceRecord::from)?)
    }

    async fn update_status(
        &self,
        record_id: Uuid,
        status: &str,
        late: bool,
        late_minutes: Option<i64>,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let timer = QueryTimer::new("update_attendance_status");
        let result = sqlx::query_as::<_, AttendanceRecordEntity>(
            r#"
            UPDATE attendance_records
            SET status = $2, late = $3, late_minutes = $4
            WHERE id = $1 AND deleted = false
            RETURNING *
            "#,
        )
        .bind(record_id)
        .bind(status)
        .bind(late)
        .bind(late_minutes)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(store_error)?.map(AttendanceRecord::from))
    }

    async fn set_checked_out(
        &self,
        record_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let timer = QueryTimer::new("set_attendance_checked_out");
        let result = sqlx::query_as::<_, AttendanceRecordEntity>(
            r#"
            UPDATE attendance_records
            SET checked_out_at = $2
            WHERE id = $1 AND deleted = false
            RETURNING *
            "#,
        )
        .bind(record_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(store_error)?.map(AttendanceRecord::from))
    }

    async fn hard_delete(&self, record_id: Uuid) -> Result<(), StoreError> {
        let timer = QueryTimer::new("hard_delete_attendance");
        let result = sqlx::query(
            r#"
            DELETE FROM attendance_records WHERE id = $1
            "#,
        )
        .bind(record_id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map_err(store_error)?;
        Ok(())
    }
}
