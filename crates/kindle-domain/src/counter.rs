//! Streak counting
//!
//! A streak is the run of consecutive counted days ending at today or
//! yesterday. Counted days are full days plus frozen (recovered) days.
//! Ember days never count toward continuity.

use crate::{CivilDate, DayLedger};
use std::collections::BTreeSet;

/// Count the current streak over `history ∪ frozen_days`, anchored at `today`
///
/// # Examples
///
/// ```
/// use kindle_domain::{count_streak, CivilDate};
/// use std::collections::BTreeSet;
///
/// let d = |s: &str| s.parse::<CivilDate>().unwrap();
/// let history: BTreeSet<_> = [d("2024-01-03"), d("2024-01-04"), d("2024-01-05")].into();
///
/// assert_eq!(count_streak(&history, &BTreeSet::new(), d("2024-01-06")), 3);
/// assert_eq!(count_streak(&history, &BTreeSet::new(), d("2024-01-08")), 0);
/// ```
pub fn count_streak(
    history: &BTreeSet<CivilDate>,
    frozen_days: &BTreeSet<CivilDate>,
    today: CivilDate,
) -> u32 {
    let effective: BTreeSet<CivilDate> = history.union(frozen_days).copied().collect();

    let Some(&latest) = effective.iter().next_back() else {
        return 0;
    };
    if latest != today && latest != today.pred() {
        return 0;
    }

    let mut streak = 0;
    let mut expected = latest;
    for day in effective.iter().rev() {
        if *day != expected {
            break;
        }
        streak += 1;
        expected = expected.pred();
    }
    streak
}

/// Count the current streak of a ledger
pub fn count_ledger(days: &DayLedger, today: CivilDate) -> u32 {
    count_streak(days.history(), days.frozen_days(), today)
}
