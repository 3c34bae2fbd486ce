//! Event entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use sqlx::FromRow;

use domain::models::event::{CheckInMethod, Event, EventLocation, Recurrence};

/// Database row mapping for the events table.
///
/// The recurrence descriptor is stored flattened: a kind column plus a
/// weekday array that is only populated for custom schedules.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: String,
    pub team_id: String,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_m: Option<f64>,
    pub recurrence: String,
    pub recurrence_weekdays: Option<Vec<String>>, // SQLx maps TEXT[] to Vec<String>
    pub recurrence_until: Option<NaiveDate>,
    pub assigned_group_ids: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn parse_recurrence(kind: &str, weekdays: Option<&[String]>) -> Recurrence {
    match kind {
        "daily" => Recurrence::Daily,
        "weekly" => Recurrence::Weekly,
        "biweekly" => Recurrence::Biweekly,
        "monthly" => Recurrence::Monthly,
        "custom" => Recurrence::Custom {
            weekdays: weekdays
                .unwrap_or_default()
                .iter()
                .filter_map(|s| s.parse::<Weekday>().ok())
                .collect(),
        },
        _ => Recurrence::None,
    }
}

impl From<EventEntity> for Event {
    fn from(entity: EventEntity) -> Self {
        let location = match (entity.latitude, entity.longitude) {
            (Some(latitude), Some(longitude)) => Some(EventLocation {
                latitude,
                longitude,
                radius_m: entity.radius_m,
            }),
            _ => None,
        };
        Self {
            id: entity.id,
            team_id: entity.team_id,
            title: entity.title,
            starts_at: entity.starts_at,
            ends_at: entity.ends_at,
            location,
            recurrence: parse_recurrence(
                &entity.recurrence,
                entity.recurrence_weekdays.as_deref(),
            ),
            recurrence_until: entity.recurrence_until,
            assigned_group_ids: entity.assigned_group_ids,
            allowed_methods: entity
                .allowed_methods
                .iter()
                .filter_map(|s| CheckInMethod::from_str(s))
                .collect(),
            created_by: entity.created_by,
        }
    }
}
