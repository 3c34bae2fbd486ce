//! Attendance group and team-role models.

use serde::{Deserialize, Serialize};

/// A named subset of a team that an event can be assigned to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceGroup {
    pub id: String,
    pub team_id: String,
    pub name: String,
}

/// Team-scoped role held by a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Owner,
    Coach,
    Player,
}

impl TeamRole {
    /// Whether this role qualifies for delegated (override) marking.
    pub fn can_mark_others(&self) -> bool {
        matches!(self, TeamRole::Owner | TeamRole::Coach)
    }

    /// Converts to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Owner => "owner",
            TeamRole::Coach => "coach",
            TeamRole::Player => "player",
        }
    }

    /// Parses from database string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(TeamRole::Owner),
            "coach" => Some(TeamRole::Coach),
            "player" => Some(TeamRole::Player),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [TeamRole::Owner, TeamRole::Coach, TeamRole::Player] {
            assert_eq!(TeamRole::from_str(role.as_str()), Some(role));
        }
        assert_eq!(TeamRole::from_str("manager"), None);
    }

    #[test]
    fn test_can_mark_others() {
        assert!(TeamRole::Owner.can_mark_others());
        assert!(TeamRole::Coach.can_mark_others());
        assert!(!TeamRole::Player.can_mark_others());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&TeamRole::Coach).unwrap(), "\"coach\"");
        let role: TeamRole = serde_json::from_str("\"player\"").unwrap();
        assert_eq!(role, TeamRole::Player);
    }
}
