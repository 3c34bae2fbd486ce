//! Occurrence resolution.
//!
//! Maps a possibly-composite occurrence reference (`<eventId>` or
//! `<eventId>:<YYYY-MM-DD>`) to a canonical base event plus resolved
//! occurrence date, and derives the occurrence-specific start/end
//! instants by re-anchoring the template time-of-day. No timezone
//! conversion happens here; template instants are UTC throughout.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::event::Event;
use crate::outcome::{CheckInFailure, FailureCode, Outcome};

/// Parsed occurrence reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceRef {
    pub event_id: String,
    pub date: Option<NaiveDate>,
}

impl OccurrenceRef {
    /// Parses `<eventId>` or `<eventId>:<YYYY-MM-DD>`.
    ///
    /// A trailing segment that is not a valid calendar date is treated
    /// as part of the event id.
    pub fn parse(reference: &str) -> Outcome<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(CheckInFailure::new(
                FailureCode::EventNotFound,
                "Empty occurrence reference",
            ));
        }

        if let Some((prefix, suffix)) = reference.rsplit_once(':') {
            if !prefix.is_empty() {
                if let Ok(date) = NaiveDate::parse_from_str(suffix, "%Y-%m-%d") {
                    return Ok(Self {
                        event_id: prefix.to_string(),
                        date: Some(date),
                    });
                }
            }
        }

        Ok(Self {
            event_id: reference.to_string(),
            date: None,
        })
    }
}

/// A canonical occurrence: base event plus concrete start/end instants.
///
/// Invariant: `occurrence_date` is `None` exactly when the event is
/// non-recurring.
#[derive(Debug, Clone)]
pub struct ResolvedOccurrence {
    pub event: Event,
    pub occurrence_date: Option<NaiveDate>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Resolves the effective occurrence for an event.
///
/// Date precedence for recurring events: reference-suffix date, then the
/// explicit occurrence-date argument, then the date component of the
/// template start. Non-recurring events always resolve to a `None`
/// occurrence date and the template instants.
pub fn resolve(
    event: Event,
    reference: &OccurrenceRef,
    explicit_date: Option<NaiveDate>,
) -> Outcome<ResolvedOccurrence> {
    let duration = event.ends_at - event.starts_at;

    if !event.is_recurring() {
        let (starts_at, ends_at) = (event.starts_at, event.ends_at);
        return Ok(ResolvedOccurrence {
            event,
            occurrence_date: None,
            starts_at,
            ends_at,
        });
    }

    let date = reference
        .date
        .or(explicit_date)
        .unwrap_or_else(|| event.starts_at.date_naive());

    let starts_at = date.and_time(event.starts_at.time()).and_utc();
    let ends_at = starts_at + duration;

    Ok(ResolvedOccurrence {
        event,
        occurrence_date: Some(date),
        starts_at,
        ends_at,
    })
}
