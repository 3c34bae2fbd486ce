//! Roster repository: group membership and team-role lookups.

use async_trait::async_trait;
use sqlx::PgPool;

use domain::models::group::TeamRole;
use domain::services::store::{RosterStore, StoreError};

use crate::entities::TeamMemberEntity;
use crate::metrics::QueryTimer;
use crate::repositories::store_error;

/// Repository for roster lookups.
#[derive(Clone)]
pub struct RosterRepository {
    pool: PgPool,
}

impl RosterRepository {
    /// Creates a new RosterRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_member(
        &self,
        team_id: &str,
        participant_id: &str,
    ) -> Result<Option<TeamMemberEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_team_member");
        let result = sqlx::query_as::<_, TeamMemberEntity>(
            r#"
            SELECT * FROM team_members
            WHERE team_id = $1 AND participant_id = $2
            "#,
        )
        .bind(team_id)
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[async_trait]
impl RosterStore for RosterRepository {
    async fn group_names(&self, group_ids: &[String]) -> Result<Vec<String>, StoreError> {
        let timer = QueryTimer::new("find_group_names");
        let result = sqlx::query_scalar::<_, String>(
            r#"
            SELECT name FROM attendance_groups
            WHERE id = ANY($1)
            ORDER BY name
            "#,
        )
        .bind(group_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result.map_err(store_error)
    }

    async fn is_member_of_any(
        &self,
        participant_id: &str,
        group_ids: &[String],
    ) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("check_group_membership");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM group_members
                WHERE participant_id = $1 AND group_id = ANY($2)
            )
            "#,
        )
        .bind(participant_id)
        .bind(group_ids)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map_err(store_error)
    }

    async fn team_role(
        &self,
        team_id: &str,
        participant_id: &str,
    ) -> Result<Option<TeamRole>, StoreError> {
        let member = self
            .find_member(team_id, participant_id)
            .await
            .map_err(store_error)?;
        Ok(member.and_then(|m| m.team_role()))
    }

    async fn is_team_manager(
        &self,
        team_id: &str,
        participant_id: &str,
    ) -> Result<bool, StoreError> {
        let member = self
            .find_member(team_id, participant_id)
            .await
            .map_err(store_error)?;
        Ok(member.map(|m| m.is_manager).unwrap_or(false))
    }
}
