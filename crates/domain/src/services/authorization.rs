//! Authorization gate for check-in attempts.
//!
//! Runs before any mutation. Self-service (or an override a caller
//! targets at themselves) is gated on assigned-group membership;
//! delegated marking bypasses the group check and is gated on a
//! qualifying team role instead.

use crate::models::event::{CheckInMethod, Event};
use crate::outcome::{CheckInFailure, FailureCode, Outcome};
use crate::services::store::{RosterStore, StoreError};

/// Whether a participant is qualified to mark attendance for others on
/// this team. A per-team role row wins; without one, the coarser
/// team-membership manager flag decides.
///
/// Every delegated surface (override marking, scan-token issuance,
/// record removal, roster listing) gates on this.
pub async fn is_marker(
    roster: &dyn RosterStore,
    team_id: &str,
    participant_id: &str,
) -> Result<bool, StoreError> {
    match roster.team_role(team_id, participant_id).await? {
        Some(role) => Ok(role.can_mark_others()),
        None => roster.is_team_manager(team_id, participant_id).await,
    }
}

/// Authorization decisions over group membership and role data.
pub struct AuthorizationGate<'a> {
    roster: &'a dyn RosterStore,
}

impl<'a> AuthorizationGate<'a> {
    pub fn new(roster: &'a dyn RosterStore) -> Self {
        Self { roster }
    }

    /// Decides whether `caller_id` may mark attendance for `target_id`
    /// on this event.
    ///
    /// `carries_coordinates` is true when the request included
    /// geolocation fields; a delegated marking carrying them is a
    /// caller contract violation.
    pub async fn authorize(
        &self,
        event: &Event,
        caller_id: &str,
        target_id: &str,
        method: CheckInMethod,
        carries_coordinates: bool,
    ) -> Outcome<()> {
        let delegated = method == CheckInMethod::Override && caller_id != target_id;

        if delegated {
            self.authorize_delegated(event, caller_id, carries_coordinates)
                .await
        } else {
            self.authorize_self_service(event, caller_id).await
        }
    }

    async fn authorize_delegated(
        &self,
        event: &Event,
        caller_id: &str,
        carries_coordinates: bool,
    ) -> Outcome<()> {
        if carries_coordinates {
            return Err(CheckInFailure::new(
                FailureCode::InvalidManualCheckin,
                "A delegated marking must not carry geolocation fields",
            ));
        }

        let qualified = is_marker(self.roster, &event.team_id, caller_id)
            .await
            .map_err(store_failure)?;

        if qualified {
            Ok(())
        } else {
            Err(CheckInFailure::new(
                FailureCode::PermissionDenied,
                "Caller is not allowed to mark attendance for others",
            ))
        }
    }

    async fn authorize_self_service(&self, event: &Event, caller_id: &str) -> Outcome<()> {
        if event.assigned_group_ids.is_empty() {
            return Ok(());
        }

        let member = self
            .roster
            .is_member_of_any(caller_id, &event.assigned_group_ids)
            .await
            .map_err(store_failure)?;
        if member {
            return Ok(());
        }

        let names = self
            .roster
            .group_names(&event.assigned_group_ids)
            .await
            .unwrap_or_default();
        let listed = if names.is_empty() {
            event.assigned_group_ids.join(", ")
        } else {
            names.join(", ")
        };

        Err(CheckInFailure::new(
            FailureCode::NotInGroup,
            format!("Event is restricted to groups: {}", listed),
        ))
    }
}

pub(crate) fn store_failure(err: StoreError) -> CheckInFailure {
    CheckInFailure::new(FailureCode::StoreUnavailable, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::Recurrence;
    use crate::models::group::TeamRole;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    struct FakeRoster {
        memberships: Vec<(String, String)>,
        roles: HashMap<String, TeamRole>,
        managers: Vec<String>,
        names: HashMap<String, String>,
    }

    impl FakeRoster {
        fn empty() -> Self {
            Self {
                memberships: vec![],
                roles: HashMap::new(),
                managers: vec![],
                names: HashMap::new(),
            }
        }
    }

    #[async_trait]
    impl RosterStore for FakeRoster {
        async fn group_names(&self, group_ids: &[String]) -> Result<Vec<String>, StoreError> {
            Ok(group_ids
                .iter()
                .filter_map(|id| self.names.get(id).cloned())
                .collect())
        }

        async fn is_member_of_any(
            &self,
            participant_id: &str,
            group_ids: &[String],
        ) -> Result<bool, StoreError> {
            Ok(group_ids.iter().any(|g| {
                self.memberships
                    .iter()
                    .any(|(gid, pid)| gid == g && pid == participant_id)
            }))
        }

        async fn team_role(
            &self,
            _team_id: &str,
            participant_id: &str,
        ) -> Result<Option<TeamRole>, StoreError> {
            Ok(self.roles.get(participant_id).copied())
        }

        async fn is_team_manager(
            &self,
            _team_id: &str,
            participant_id: &str,
        ) -> Result<bool, StoreError> {
            Ok(self.managers.iter().any(|p| p == participant_id))
        }
    }

    fn event(groups: Vec<&str>) -> Event {
        Event {
            id: "E1".to_string(),
            team_id: "T1".to_string(),
            title: "Practice".to_string(),
            starts_at: Utc.with_ymd_and_hms(2025, 9, 1, 15, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2025, 9, 1, 17, 0, 0).unwrap(),
            location: None,
            recurrence: Recurrence::None,
            recurrence_until: None,
            assigned_group_ids: groups.into_iter().map(String::from).collect(),
            allowed_methods: vec![CheckInMethod::Token],
            created_by: "coach-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_event_admits_anyone() {
        let roster = FakeRoster::empty();
        let gate = AuthorizationGate::new(&roster);
        let result = gate
            .authorize(&event(vec![]), "P1", "P1", CheckInMethod::Token, false)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_group_member_admitted() {
        let mut roster = FakeRoster::empty();
        roster.memberships.push(("G1".to_string(), "P1".to_string()));
        let gate = AuthorizationGate::new(&roster);
        let result = gate
            .authorize(&event(vec!["G1", "G2"]), "P1", "P1", CheckInMethod::Token, false)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_non_member_rejected_naming_groups() {
        let mut roster = FakeRoster::empty();
        roster.names.insert("G1".to_string(), "Goalkeepers".to_string());
        let gate = AuthorizationGate::new(&roster);
        let err = gate
            .authorize(&event(vec!["G1"]), "P1", "P1", CheckInMethod::Token, false)
            .await
            .unwrap_err();
        assert_eq!(err.code, FailureCode::NotInGroup);
        assert!(err.message.contains("Goalkeepers"));
    }

    #[tokio::test]
    async fn test_delegated_bypasses_group_check_for_coach() {
        let mut roster = FakeRoster::empty();
        roster.roles.insert("coach-1".to_string(), TeamRole::Coach);
        let gate = AuthorizationGate::new(&roster);
        // Target P1 is in no assigned group; a coach may still mark them.
        let result = gate
            .authorize(&event(vec!["G1"]), "coach-1", "P1", CheckInMethod::Override, false)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_delegated_denied_for_player() {
        let mut roster = FakeRoster::empty();
        roster.roles.insert("P2".to_string(), TeamRole::Player);
        let gate = AuthorizationGate::new(&roster);
        let err = gate
            .authorize(&event(vec![]), "P2", "P1", CheckInMethod::Override, false)
            .await
            .unwrap_err();
        assert_eq!(err.code, FailureCode::PermissionDenied);
    }

    #[tokio::test]
    async fn test_delegated_falls_back_to_manager_flag() {
        let mut roster = FakeRoster::empty();
        roster.managers.push("M1".to_string());
        let gate = AuthorizationGate::new(&roster);
        let result = gate
            .authorize(&event(vec![]), "M1", "P1", CheckInMethod::Override, false)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_delegated_with_coordinates_is_contract_violation() {
        let mut roster = FakeRoster::empty();
        roster.roles.insert("coach-1".to_string(), TeamRole::Coach);
        let gate = AuthorizationGate::new(&roster);
        let err = gate
            .authorize(&event(vec![]), "coach-1", "P1", CheckInMethod::Override, true)
            .await
            .unwrap_err();
        assert_eq!(err.code, FailureCode::InvalidManualCheckin);
    }

    #[tokio::test]
    async fn test_role_row_wins_over_manager_flag() {
        let mut roster = FakeRoster::empty();
        roster.roles.insert("P2".to_string(), TeamRole::Player);
        roster.managers.push("P2".to_string());

        // A player with a stale manager flag is still not a marker.
        assert!(!is_marker(&roster, "T1", "P2").await.unwrap());
    }

    #[tokio::test]
    async fn test_manager_flag_decides_without_role_row() {
        let mut roster = FakeRoster::empty();
        roster.managers.push("M1".to_string());

        assert!(is_marker(&roster, "T1", "M1").await.unwrap());
        assert!(!is_marker(&roster, "T1", "P1").await.unwrap());
    }

    #[tokio::test]
    async fn test_override_on_self_uses_group_check() {
        let roster = FakeRoster::empty();
        let gate = AuthorizationGate::new(&roster);
        let err = gate
            .authorize(&event(vec!["G1"]), "P1", "P1", CheckInMethod::Override, false)
            .await
            .unwrap_err();
        assert_eq!(err.code, FailureCode::NotInGroup);
    }
}
