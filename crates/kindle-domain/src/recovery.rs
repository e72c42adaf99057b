//! Freeze recovery planning
//!
//! Finds the most recent gap behind the intact streak tail and prices it in
//! freeze currency: one unit per missing day. A gap is only recoverable when
//! a counted day exists before it (the anchor), i.e. there was a streak to
//! restore.

use crate::CivilDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Days examined past the intact tail before giving up
pub const RECOVERY_SCAN_LIMIT_DAYS: u32 = 30;

/// Outcome of recovery planning
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryPlan {
    /// Whether the gap can be bridged
    pub recoverable: bool,

    /// Missing days, newest first
    pub missing_dates: Vec<CivilDate>,

    /// Freeze units the recovery costs
    pub days_needed: u32,
}

impl RecoveryPlan {
    fn unrecoverable() -> Self {
        Self::default()
    }
}

/// Plan recovery of the gap behind the current streak tail
///
/// The walk starts at yesterday, skips every counted day of the intact tail,
/// then collects missing days until a counted day (the anchor) appears or
/// `scan_limit` days have been examined.
pub fn plan_recovery(
    history: &BTreeSet<CivilDate>,
    frozen_days: &BTreeSet<CivilDate>,
    today: CivilDate,
    scan_limit: u32,
) -> RecoveryPlan {
    let counted = |d: &CivilDate| history.contains(d) || frozen_days.contains(d);

    let mut cursor = today.pred();
    while counted(&cursor) {
        cursor = cursor.pred();
    }

    let mut missing = Vec::new();
    let mut anchored = false;
    for _ in 0..scan_limit {
        if counted(&cursor) {
            anchored = true;
            break;
        }
        missing.push(cursor);
        cursor = cursor.pred();
    }

    if !anchored || missing.is_empty() {
        return RecoveryPlan::unrecoverable();
    }

    RecoveryPlan {
        recoverable: true,
        days_needed: missing.len() as u32,
        missing_dates: missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> CivilDate {
        s.parse().unwrap()
    }

    fn set(days: &[&str]) -> BTreeSet<CivilDate> {
        days.iter().map(|d| date(d)).collect()
    }

    #[test]
    fn test_gap_behind_intact_tail() {
        let history = set(&["2024-02-01", "2024-01-28"]);
        let plan = plan_recovery(&history, &BTreeSet::new(), date("2024-02-02"), RECOVERY_SCAN_LIMIT_DAYS);

        assert!(plan.recoverable);
        assert_eq!(
            plan.missing_dates,
            vec![date("2024-01-31"), date("2024-01-30"), date("2024-01-29")]
        );
        assert_eq!(plan.days_needed, 3);
    }

    #[test]
    fn test_gap_starting_yesterday() {
        let history = set(&["2024-02-02", "2024-01-30"]);
        let plan = plan_recovery(&history, &BTreeSet::new(), date("2024-02-02"), RECOVERY_SCAN_LIMIT_DAYS);
        assert!(plan.recoverable);
        assert_eq!(plan.missing_dates, vec![date("2024-02-01"), date("2024-01-31")]);
    }

    #[test]
    fn test_no_anchor_is_unrecoverable() {
        let plan = plan_recovery(&BTreeSet::new(), &BTreeSet::new(), date("2024-02-02"), RECOVERY_SCAN_LIMIT_DAYS);
        assert_eq!(plan, RecoveryPlan::default());
    }

    #[test]
    fn test_gap_beyond_scan_limit() {
        let history = set(&["2023-12-01"]);
        let plan = plan_recovery(&history, &BTreeSet::new(), date("2024-02-02"), RECOVERY_SCAN_LIMIT_DAYS);
        assert!(!plan.recoverable);
        assert!(plan.missing_dates.is_empty());
        assert_eq!(plan.days_needed, 0);
    }

    #[test]
    fn test_frozen_days_act_as_anchor_and_tail() {
        let history = set(&["2024-02-01"]);
        let frozen = set(&["2024-01-31", "2024-01-28"]);
        let plan = plan_recovery(&history, &frozen, date("2024-02-02"), RECOVERY_SCAN_LIMIT_DAYS);
        assert_eq!(plan.missing_dates, vec![date("2024-01-30"), date("2024-01-29")]);
    }

    #[test]
    fn test_scan_limit_is_respected() {
        // 30 missing days then an anchor on the 31st: out of reach
        let today = date("2024-03-01");
        let mut anchor = today.pred();
        for _ in 0..30 {
            anchor = anchor.pred();
        }
        let history: BTreeSet<_> = [anchor].into();
        assert!(!plan_recovery(&history, &BTreeSet::new(), today, 30).recoverable);
        assert!(plan_recovery(&history, &BTreeSet::new(), today, 31).recoverable);
    }
}
