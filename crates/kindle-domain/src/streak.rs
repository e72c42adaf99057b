//! Streak state - the persisted, derived record kept per user
//!
//! [`StreakState`] is written only by the engine's sync service. Its day sets
//! live in a [`DayLedger`], which keeps full days and ember days disjoint by
//! construction: the only way to put a day into either set is one of the
//! named `mark_*` operations.

use crate::{CivilDate, DayClass, DomainError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Today's classification snapshot, persisted for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakClass {
    /// Full day
    Active,

    /// Partial (ember) day
    Frozen,

    /// Nothing completed
    #[default]
    Extinguished,
}

impl StreakClass {
    /// Get the class name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            StreakClass::Active => "active",
            StreakClass::Frozen => "frozen",
            StreakClass::Extinguished => "extinguished",
        }
    }
}

impl From<DayClass> for StreakClass {
    fn from(class: DayClass) -> Self {
        match class {
            DayClass::Full => StreakClass::Active,
            DayClass::Partial => StreakClass::Frozen,
            DayClass::None => StreakClass::Extinguished,
        }
    }
}

/// The three day sets behind a streak
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "DayLedgerRepr")]
pub struct DayLedger {
    history: BTreeSet<CivilDate>,
    ember_days: BTreeSet<CivilDate>,
    frozen_days: BTreeSet<CivilDate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DayLedgerRepr {
    #[serde(default)]
    history: BTreeSet<CivilDate>,
    #[serde(default)]
    ember_days: BTreeSet<CivilDate>,
    #[serde(default)]
    frozen_days: BTreeSet<CivilDate>,
}

impl TryFrom<DayLedgerRepr> for DayLedger {
    type Error = DomainError;

    fn try_from(repr: DayLedgerRepr) -> Result<Self, Self::Error> {
        DayLedger::from_parts(repr.history, repr.ember_days, repr.frozen_days)
    }
}

impl DayLedger {
    /// Build a ledger from raw sets, rejecting a day that is both full and ember
    pub fn from_parts(
        history: BTreeSet<CivilDate>,
        ember_days: BTreeSet<CivilDate>,
        frozen_days: BTreeSet<CivilDate>,
    ) -> Result<Self, DomainError> {
        if let Some(day) = history.intersection(&ember_days).next() {
            return Err(DomainError::OverlappingDay(day.to_string()));
        }
        Ok(Self {
            history,
            ember_days,
            frozen_days,
        })
    }

    /// Record `day` as a full day. Returns true if anything changed.
    pub fn mark_full(&mut self, day: CivilDate) -> bool {
        let added = self.history.insert(day);
        let moved = self.ember_days.remove(&day);
        added || moved
    }

    /// Record `day` as an ember day. Returns true if anything changed.
    pub fn mark_partial(&mut self, day: CivilDate) -> bool {
        let added = self.ember_days.insert(day);
        let moved = self.history.remove(&day);
        added || moved
    }

    /// Forget `day` in both sets. Returns true if anything changed.
    pub fn mark_none(&mut self, day: CivilDate) -> bool {
        let full = self.history.remove(&day);
        let ember = self.ember_days.remove(&day);
        full || ember
    }

    /// Count `days` toward the streak via freeze spend. Returns how many were new.
    pub fn freeze(&mut self, days: &[CivilDate]) -> usize {
        days.iter().filter(|d| self.frozen_days.insert(**d)).count()
    }

    /// Full days
    pub fn history(&self) -> &BTreeSet<CivilDate> {
        &self.history
    }

    /// Ember (partial) days
    pub fn ember_days(&self) -> &BTreeSet<CivilDate> {
        &self.ember_days
    }

    /// Days recovered with freeze currency
    pub fn frozen_days(&self) -> &BTreeSet<CivilDate> {
        &self.frozen_days
    }

    /// The most recent full day
    pub fn latest_full_day(&self) -> Option<CivilDate> {
        self.history.iter().next_back().copied()
    }
}

/// Per-user streak record
///
/// Field names follow the persisted document layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakState {
    /// Running streak length; always re-derivable from the ledger
    pub streak_count: u32,

    /// Full, ember and frozen days
    #[serde(flatten)]
    pub days: DayLedger,

    /// Spendable freeze currency
    pub streak_freezes: u32,

    /// `streak / 7` milestones that already paid out
    pub awarded_milestones: BTreeSet<u32>,

    /// Today's classification snapshot
    pub streak_state: StreakClass,

    /// Today's completion percentage
    pub completion_percentage: u8,

    /// Most recent civil day added to history or ember days
    #[serde(rename = "lastCompletedDateIST")]
    pub last_completed_date_ist: Option<CivilDate>,

    /// Instant of the most recent stamp
    pub last_completed_date: Option<DateTime<Utc>>,
}

/// The read model handed to profile, friends and group readers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSnapshot {
    /// Streak length
    pub streak: u32,

    /// Whether this call changed the streak length
    pub streak_updated: bool,

    /// Instant of the most recent stamp
    pub last_completed_date: Option<DateTime<Utc>>,

    /// Full days, oldest first
    pub history: Vec<CivilDate>,

    /// Most recent civil day added to history or ember days
    #[serde(rename = "lastCompletedDateIST")]
    pub last_completed_date_ist: Option<CivilDate>,

    /// Spendable freeze currency
    pub streak_freezes: u32,

    /// Recovered days, oldest first
    pub frozen_days: Vec<CivilDate>,

    /// Ember days, oldest first
    pub ember_days: Vec<CivilDate>,

    /// Today's classification snapshot
    pub streak_state: StreakClass,

    /// Today's completion percentage
    pub completion_percentage: u8,

    /// Active habits completed today
    pub completed_habits: usize,

    /// Active habits today
    pub total_habits: usize,
}

impl StreakSnapshot {
    /// Build a snapshot of `state`
    pub fn from_state(
        state: &StreakState,
        streak_updated: bool,
        completed_habits: usize,
        total_habits: usize,
    ) -> Self {
        Self {
            streak: state.streak_count,
            streak_updated,
            last_completed_date: state.last_completed_date,
            history: state.days.history().iter().copied().collect(),
            last_completed_date_ist: state.last_completed_date_ist,
            streak_freezes: state.streak_freezes,
            frozen_days: state.days.frozen_days().iter().copied().collect(),
            ember_days: state.days.ember_days().iter().copied().collect(),
            streak_state: state.streak_state,
            completion_percentage: state.completion_percentage,
            completed_habits,
            total_habits,
        }
    }
}
