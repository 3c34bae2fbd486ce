//! Event domain model.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// How a participant is allowed to mark attendance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckInMethod {
    Token,
    Geolocation,
    Override,
}

impl CheckInMethod {
    /// Converts to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInMethod::Token => "token",
            CheckInMethod::Geolocation => "geolocation",
            CheckInMethod::Override => "override",
        }
    }

    /// Parses from database string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "token" => Some(CheckInMethod::Token),
            "geolocation" => Some(CheckInMethod::Geolocation),
            "override" => Some(CheckInMethod::Override),
            _ => None,
        }
    }
}

/// Recurrence descriptor for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum Recurrence {
    None,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    /// Repeats on a fixed set of weekdays.
    Custom { weekdays: Vec<Weekday> },
}

impl Recurrence {
    pub fn is_recurring(&self) -> bool {
        !matches!(self, Recurrence::None)
    }
}

/// Check-in location for an event, with an optional per-event radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: Option<f64>,
}

/// A scheduled (possibly recurring) event.
///
/// `starts_at`/`ends_at` are the template instants; occurrences of a
/// recurring event re-anchor the template time-of-day onto a concrete
/// date. An empty `assigned_group_ids` means the whole team is eligible.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub team_id: String,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub location: Option<EventLocation>,
    pub recurrence: Recurrence,
    pub recurrence_until: Option<NaiveDate>,
    pub assigned_group_ids: Vec<String>,
    pub allowed_methods: Vec<CheckInMethod>,
    pub created_by: String,
}

impl Event {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_recurring()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn sample_event() -> Event {
        Event {
            id: "E1".to_string(),
            team_id: "T1".to_string(),
            title: "Evening practice".to_string(),
            starts_at: Utc.with_ymd_and_hms(2025, 9, 1, 15, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2025, 9, 1, 17, 0, 0).unwrap(),
            location: None,
            recurrence: Recurrence::None,
            recurrence_until: None,
            assigned_group_ids: vec![],
            allowed_methods: vec![CheckInMethod::Token, CheckInMethod::Geolocation],
            created_by: "coach-1".to_string(),
        }
    }

    #[test]
    fn test_method_round_trip() {
        for method in [
            CheckInMethod::Token,
            CheckInMethod::Geolocation,
            CheckInMethod::Override,
        ] {
            assert_eq!(CheckInMethod::from_str(method.as_str()), Some(method));
        }
        assert_eq!(CheckInMethod::from_str("qr"), None);
    }

    #[test]
    fn test_method_serialization() {
        assert_eq!(
            serde_json::to_string(&CheckInMethod::Geolocation).unwrap(),
            "\"geolocation\""
        );
        let method: CheckInMethod = serde_json::from_str("\"override\"").unwrap();
        assert_eq!(method, CheckInMethod::Override);
    }

    #[test]
    fn test_recurrence_is_recurring() {
        assert!(!Recurrence::None.is_recurring());
        assert!(Recurrence::Weekly.is_recurring());
        assert!(Recurrence::Custom {
            weekdays: vec![Weekday::Mon, Weekday::Wed]
        }
        .is_recurring());
    }

    #[test]
    fn test_event_is_recurring() {
        let mut event = sample_event();
        assert!(!event.is_recurring());
        event.recurrence = Recurrence::Biweekly;
        assert!(event.is_recurring());
    }
}
