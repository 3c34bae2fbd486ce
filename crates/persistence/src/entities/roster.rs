//! Roster entities: attendance groups and team membership rows.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::group::{AttendanceGroup, TeamRole};

/// Database row mapping for the attendance_groups table.
#[derive(Debug, Clone, FromRow)]
pub struct AttendanceGroupEntity {
    pub id: String,
    pub team_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<AttendanceGroupEntity> for AttendanceGroup {
    fn from(entity: AttendanceGroupEntity) -> Self {
        Self {
            id: entity.id,
            team_id: entity.team_id,
            name: entity.name,
        }
    }
}

/// Database row mapping for the team_members table.
///
/// `role` is nullable; legacy rows predate per-team roles and only
/// carry the coarser manager flag.
#[derive(Debug, Clone, FromRow)]
pub struct TeamMemberEntity {
    pub team_id: String,
    pub participant_id: String,
    pub role: Option<String>,
    pub is_manager: bool,
    pub created_at: DateTime<Utc>,
}

impl TeamMemberEntity {
    pub fn team_role(&self) -> Option<TeamRole> {
        self.role.as_deref().and_then(TeamRole::from_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn member(role: Option<&str>) -> TeamMemberEntity {
        TeamMemberEntity {
            team_id: "T1".to_string(),
            participant_id: "P1".to_string(),
            role: role.map(String::from),
            is_manager: false,
            created_at: Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(member(Some("coach")).team_role(), Some(TeamRole::Coach));
        assert_eq!(member(Some("admin")).team_role(), None);
        assert_eq!(member(None).team_role(), None);
    }
}
