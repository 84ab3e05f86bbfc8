//! Injectable clock abstraction.
//!
//! The timer engine and streak logic never read the wall clock directly --
//! they take a [`Clock`] so tests can advance virtual time deterministically.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use std::sync::Mutex;

/// Source of "now" for the timer engine and streak computation.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date in the user's local timezone.
    ///
    /// Streaks are day-granular, so the date matters more than the instant.
    fn today(&self) -> NaiveDate {
        self.day_of(self.now())
    }

    /// Calendar day an instant falls on, in the same timezone `today` uses.
    fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&Local).date_naive()
    }
}

/// Wall-clock implementation used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at the given instant.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Create a clock at midnight UTC of the given date.
    pub fn at_midnight(date: NaiveDate) -> Self {
        let start = Utc
            .from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default());
        Self::new(start)
    }

    /// Advance the clock by a number of whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::seconds(secs);
    }

    /// Advance the clock by a number of days.
    pub fn advance_days(&self, days: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::days(days);
    }

    /// Jump to an exact instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap() = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    // Virtual time stays in UTC so tests are independent of the host tz.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());
        let before = clock.now();
        clock.advance_secs(90);
        assert_eq!((clock.now() - before).num_seconds(), 90);
    }

    #[test]
    fn manual_clock_day_rollover() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 23, 59, 30).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        clock.advance_secs(60);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
    }

    #[test]
    fn system_clock_today_is_local() {
        let clock = SystemClock;
        let expected = Local::now().date_naive();
        assert_eq!(clock.today(), expected);
    }
}
