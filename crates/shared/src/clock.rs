//! Wall-clock capability.
//!
//! Every component that needs "now" receives a clock instead of reading
//! the system time directly, so tests can pin the current instant.

use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock returning a fixed, settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock to a new instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_fixed_clock_returns_pinned_instant() {
        let pinned = Utc.with_ymd_and_hms(2025, 9, 1, 15, 0, 0).unwrap();
        let clock = FixedClock::new(pinned);
        assert_eq!(clock.now(), pinned);
        assert_eq!(clock.now(), pinned);
    }

    #[test]
    fn test_fixed_clock_set() {
        let start = Utc.with_ymd_and_hms(2025, 9, 1, 15, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 9, 1, 17, 14, 0).unwrap();
        let clock = FixedClock::new(start);
        clock.set(later);
        assert_eq!(clock.now(), later);
    }
}
