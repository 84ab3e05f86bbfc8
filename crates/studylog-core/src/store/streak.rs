//! Consecutive-day streak computation.
//!
//! Pure function of the current calendar date and the stored streak state;
//! the store calls it once per committed session and the result is
//! idempotent within the same day.

use chrono::{Duration, NaiveDate};

use crate::model::StreakState;

/// Advance the streak for a session recorded on `today`.
///
/// - Same day as the last study date: no change (already counted).
/// - Last study date was yesterday: streak extends by one.
/// - Any larger gap, or no prior date: streak restarts at one.
///
/// `longest_streak` is a running max and never shrinks.
pub fn advance(state: StreakState, today: NaiveDate) -> StreakState {
    if state.last_study_date == Some(today) {
        return state;
    }

    let yesterday = today - Duration::days(1);
    let streak_days = if state.last_study_date == Some(yesterday) {
        state.streak_days + 1
    } else {
        1
    };

    StreakState {
        streak_days,
        longest_streak: state.longest_streak.max(streak_days),
        last_study_date: Some(today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn first_session_starts_streak() {
        let state = advance(StreakState::default(), date(2025, 3, 10));
        assert_eq!(state.streak_days, 1);
        assert_eq!(state.longest_streak, 1);
        assert_eq!(state.last_study_date, Some(date(2025, 3, 10)));
    }

    #[test]
    fn same_day_is_idempotent() {
        let today = date(2025, 3, 10);
        let once = advance(StreakState::default(), today);
        let twice = advance(once, today);
        assert_eq!(once, twice);
    }

    #[test]
    fn consecutive_day_extends() {
        let state = StreakState {
            streak_days: 4,
            longest_streak: 4,
            last_study_date: Some(date(2025, 3, 9)),
        };
        let next = advance(state, date(2025, 3, 10));
        assert_eq!(next.streak_days, 5);
        assert_eq!(next.longest_streak, 5);
        assert_eq!(next.last_study_date, Some(date(2025, 3, 10)));
    }

    #[test]
    fn gap_resets_but_longest_survives() {
        let state = StreakState {
            streak_days: 10,
            longest_streak: 10,
            last_study_date: Some(date(2025, 3, 5)),
        };
        let next = advance(state, date(2025, 3, 10));
        assert_eq!(next.streak_days, 1);
        assert_eq!(next.longest_streak, 10);
        assert_eq!(next.last_study_date, Some(date(2025, 3, 10)));
    }

    #[test]
    fn longest_is_running_max_not_current() {
        let state = StreakState {
            streak_days: 2,
            longest_streak: 7,
            last_study_date: Some(date(2025, 3, 9)),
        };
        let next = advance(state, date(2025, 3, 10));
        assert_eq!(next.streak_days, 3);
        assert_eq!(next.longest_streak, 7);
    }

    proptest! {
        #[test]
        fn longest_never_shrinks(
            streak_days in 0u32..1000,
            longest in 0u32..1000,
            day_offset in 0i64..3650,
            gap in 1i64..30,
        ) {
            let base = date(2020, 1, 1) + Duration::days(day_offset);
            let state = StreakState {
                streak_days,
                longest_streak: longest,
                last_study_date: Some(base),
            };
            let next = advance(state, base + Duration::days(gap));
            prop_assert!(next.longest_streak >= longest);
            prop_assert!(next.longest_streak >= next.streak_days);
        }

        #[test]
        fn advancing_twice_same_day_is_fixed_point(
            streak_days in 0u32..1000,
            day_offset in 0i64..3650,
        ) {
            let today = date(2020, 1, 1) + Duration::days(day_offset);
            let state = StreakState {
                streak_days,
                longest_streak: streak_days,
                last_study_date: None,
            };
            let once = advance(state, today);
            prop_assert_eq!(once, advance(once, today));
        }
    }
}
