//! The streak synchronization service
//!
//! [`StreakSyncService`] is the only code that writes a user's
//! [`StreakState`]. Every write happens under the user's lock as one
//! versioned document replace.

use crate::error::store_err;
use crate::locks::{UserGuard, UserLocks};
use crate::{EngineConfig, EngineError, EngineStore, SyncMetrics};
use kindle_domain::{
    classify, count_ledger, plan_recovery, CivilDate, Classification, Clock, DayClass,
    DayLedger, Habit, RecoveryPlan, StreakSnapshot, StreakState, TimeAnchor, UserId,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Attempts at a sync before a persistent write conflict is reported
const MAX_SYNC_ATTEMPTS: u32 = 3;

/// Stored streak count next to a fresh recount of the stored ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recount {
    /// Count held in the stored document
    pub stored: u32,

    /// Count derived from the stored full and frozen days as of today
    pub recomputed: u32,
}

impl Recount {
    /// Whether the stored count matches the derivation
    pub fn is_consistent(&self) -> bool {
        self.stored == self.recomputed
    }
}

/// Orchestrates classification, counting, the milestone economy and
/// freeze recovery for each user
///
/// # Examples
///
/// ```no_run
/// use kindle_domain::{SystemClock, UserId};
/// use kindle_engine::{EngineConfig, StreakSyncService};
/// use kindle_store::SqliteStore;
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(SqliteStore::new("kindle.db")?);
/// let engine = StreakSyncService::new(store, EngineConfig::default(), Arc::new(SystemClock))?;
///
/// let user: UserId = "01890a5d-ac96-774b-bcce-b302099a8057".parse()?;
/// let snapshot = engine.sync(user)?;
/// println!("streak: {}", snapshot.streak);
/// # Ok(())
/// # }
/// ```
pub struct StreakSyncService<S> {
    store: Arc<S>,
    anchor: TimeAnchor,
    config: EngineConfig,
    locks: UserLocks,
    metrics: Mutex<SyncMetrics>,
}

impl<S: EngineStore> StreakSyncService<S> {
    /// Create a service over `store`, reading time from `clock`
    pub fn new(store: Arc<S>, config: EngineConfig, clock: Arc<dyn Clock>) -> Result<Self, EngineError> {
        let anchor = config.anchor(clock)?;
        Ok(Self {
            store,
            anchor,
            config,
            locks: UserLocks::new(),
            metrics: Mutex::new(SyncMetrics::new()),
        })
    }

    /// The civil-time anchor every date decision goes through
    pub fn anchor(&self) -> &TimeAnchor {
        &self.anchor
    }

    /// The active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A copy of the counters collected so far
    pub fn metrics(&self) -> SyncMetrics {
        self.metrics_mut().clone()
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn lock_user(&self, user: UserId) -> UserGuard<'_> {
        self.locks.lock(user)
    }

    fn metrics_mut(&self) -> MutexGuard<'_, SyncMetrics> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Recompute today's classification and streak for `user`
    ///
    /// A day with no active habit is a pure read: the stored snapshot is
    /// returned and nothing is written. Otherwise the document is written
    /// only when something in it changed, so calling this twice in a row
    /// performs at most one write.
    pub fn sync(&self, user: UserId) -> Result<StreakSnapshot, EngineError> {
        let _guard = self.lock_user(user);
        self.sync_locked(user)
    }

    /// Body of [`sync`](Self::sync); the caller holds `user`'s lock
    ///
    /// The per-user lock only covers this process. A write that loses to
    /// another process is recomputed from a fresh read.
    pub(crate) fn sync_locked(&self, user: UserId) -> Result<StreakSnapshot, EngineError> {
        let mut attempt = 1;
        loop {
            match self.sync_once(user) {
                Err(EngineError::Conflict(reason)) if attempt < MAX_SYNC_ATTEMPTS => {
                    tracing::warn!(user = %user, attempt, %reason, "Streak write lost to a concurrent writer, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn sync_once(&self, user: UserId) -> Result<StreakSnapshot, EngineError> {
        self.require_user(user)?;
        let habits = self.store.habits_for_user(user).map_err(store_err)?;
        let (stored, version) = self.load_state(user)?;
        let today = self.anchor.today();

        let progress = match classify(&habits, today) {
            Classification::RestDay => {
                tracing::debug!(user = %user, %today, "Rest day, streak left untouched");
                let mut metrics = self.metrics_mut();
                metrics.record_sync();
                metrics.record_rest_day();
                return Ok(StreakSnapshot::from_state(&stored, false, 0, 0));
            }
            Classification::Scored(progress) => progress,
        };

        let mut state = stored.clone();
        let history_changed = match progress.class {
            DayClass::Full => self.stamp(&mut state, today, DayLedger::mark_full),
            DayClass::Partial => self.stamp(&mut state, today, DayLedger::mark_partial),
            DayClass::None => {
                let changed = state.days.mark_none(today);
                if changed {
                    state.last_completed_date_ist = state.days.latest_full_day();
                }
                changed
            }
        };

        let old_count = stored.streak_count;
        let new_count = count_ledger(&state.days, today);
        self.settle_milestones(user, &mut state, old_count, new_count, history_changed);

        state.streak_count = new_count;
        state.completion_percentage = progress.percentage;
        state.streak_state = progress.class.into();

        if state != stored || history_changed {
            self.store
                .save_streak(user, &state, version)
                .map_err(store_err)?;
            tracing::debug!(user = %user, streak = new_count, class = state.streak_state.as_str(), "Streak state written");
            self.metrics_mut().record_write();
        } else {
            tracing::debug!(user = %user, "Streak state unchanged, write skipped");
            self.metrics_mut().record_skipped_write();
        }
        self.metrics_mut().record_sync();

        Ok(StreakSnapshot::from_state(
            &state,
            new_count != old_count,
            progress.completed,
            progress.total,
        ))
    }

    /// Mark `today` and stamp the completion dates if that changed anything
    fn stamp<F>(&self, state: &mut StreakState, today: CivilDate, mark: F) -> bool
    where
        F: FnOnce(&mut DayLedger, CivilDate) -> bool,
    {
        let changed = mark(&mut state.days, today);
        if changed {
            state.last_completed_date_ist = Some(today);
            state.last_completed_date = Some(self.anchor.now());
        }
        changed
    }

    /// Clear milestones on a break and pay out a newly reached milestone
    ///
    /// A payout needs both a higher count and a real ledger change, so a
    /// recomputation or an undo-redo of the same day never pays twice.
    fn settle_milestones(
        &self,
        user: UserId,
        state: &mut StreakState,
        old_count: u32,
        new_count: u32,
        history_changed: bool,
    ) {
        if new_count == 0 && old_count > 0 {
            state.awarded_milestones.clear();
            tracing::info!(user = %user, previous = old_count, "Streak broken, milestones reset");
            self.metrics_mut().record_reset();
        }

        if new_count > old_count && history_changed {
            let milestone = new_count / self.config.milestone_interval_days;
            if milestone > 0 && state.awarded_milestones.insert(milestone) {
                state.streak_freezes = state.streak_freezes.saturating_add(1);
                tracing::info!(
                    user = %user,
                    milestone,
                    freezes = state.streak_freezes,
                    "Milestone reached, streak freeze awarded"
                );
                self.metrics_mut().record_award();
            }
        }
    }

    /// Spend freezes to bridge the gap behind the current streak tail
    ///
    /// Fails without writing when there is nothing to recover or the user
    /// cannot afford the whole gap.
    pub fn apply_freeze(&self, user: UserId) -> Result<StreakSnapshot, EngineError> {
        let _guard = self.lock_user(user);
        self.require_user(user)?;
        let (mut state, version) = self.load_state(user)?;
        let today = self.anchor.today();

        let plan = self.plan_for(&state, today);
        if !plan.recoverable {
            tracing::warn!(user = %user, "Freeze requested with no recoverable gap");
            return Err(EngineError::NoRecoveryAvailable);
        }
        if state.streak_freezes < plan.days_needed {
            tracing::warn!(
                user = %user,
                available = state.streak_freezes,
                needed = plan.days_needed,
                "Freeze requested without enough currency"
            );
            return Err(EngineError::InsufficientCurrency {
                available: state.streak_freezes,
                needed: plan.days_needed,
            });
        }

        let old_count = state.streak_count;
        state.days.freeze(&plan.missing_dates);
        state.streak_freezes -= plan.days_needed;
        state.streak_count = count_ledger(&state.days, today);

        self.store
            .save_streak(user, &state, version)
            .map_err(store_err)?;
        tracing::info!(
            user = %user,
            spent = plan.days_needed,
            streak = state.streak_count,
            "Streak freezes applied"
        );
        {
            let mut metrics = self.metrics_mut();
            metrics.record_spend(plan.days_needed);
            metrics.record_write();
        }

        let (completed, total) = self.today_counts(user, today)?;
        Ok(StreakSnapshot::from_state(
            &state,
            state.streak_count != old_count,
            completed,
            total,
        ))
    }

    /// The recovery a freeze spend would perform right now, without spending
    pub fn plan_recovery(&self, user: UserId) -> Result<RecoveryPlan, EngineError> {
        self.require_user(user)?;
        let (state, _) = self.load_state(user)?;
        Ok(self.plan_for(&state, self.anchor.today()))
    }

    /// Recount the stored ledger without writing
    pub fn recount(&self, user: UserId) -> Result<Recount, EngineError> {
        self.require_user(user)?;
        let (state, _) = self.load_state(user)?;
        Ok(Recount {
            stored: state.streak_count,
            recomputed: count_ledger(&state.days, self.anchor.today()),
        })
    }

    /// Overwrite a user's freeze balance
    pub fn admin_set_freezes(&self, user: UserId, value: i64) -> Result<StreakSnapshot, EngineError> {
        let freezes = u32::try_from(value).map_err(|_| {
            EngineError::Validation(format!("freeze count must be within 0..={}, got {}", u32::MAX, value))
        })?;

        let _guard = self.lock_user(user);
        self.require_user(user)?;
        let (mut state, version) = self.load_state(user)?;

        if state.streak_freezes != freezes || version.is_none() {
            let previous = state.streak_freezes;
            state.streak_freezes = freezes;
            self.store
                .save_streak(user, &state, version)
                .map_err(store_err)?;
            tracing::info!(user = %user, previous, freezes, "Freeze balance overwritten");
            self.metrics_mut().record_write();
        }

        let (completed, total) = self.today_counts(user, self.anchor.today())?;
        Ok(StreakSnapshot::from_state(&state, false, completed, total))
    }

    /// The stored state as a snapshot, with today's habit counts
    pub fn snapshot(&self, user: UserId) -> Result<StreakSnapshot, EngineError> {
        self.require_user(user)?;
        let (state, _) = self.load_state(user)?;
        let (completed, total) = self.today_counts(user, self.anchor.today())?;
        Ok(StreakSnapshot::from_state(&state, false, completed, total))
    }

    fn plan_for(&self, state: &StreakState, today: CivilDate) -> RecoveryPlan {
        plan_recovery(
            state.days.history(),
            state.days.frozen_days(),
            today,
            self.config.recovery_scan_limit_days,
        )
    }

    fn today_counts(
        &self,
        user: UserId,
        today: CivilDate,
    ) -> Result<(usize, usize), EngineError> {
        let habits: Vec<Habit> = self.store.habits_for_user(user).map_err(store_err)?;
        Ok(match classify(&habits, today) {
            Classification::RestDay => (0, 0),
            Classification::Scored(p) => (p.completed, p.total),
        })
    }

    pub(crate) fn require_user(&self, user: UserId) -> Result<(), EngineError> {
        match self.store.get_user(user).map_err(store_err)? {
            Some(_) => Ok(()),
            None => Err(EngineError::NotFound(format!("user {}", user))),
        }
    }

    /// The stored state and its version, or a fresh default with no version
    fn load_state(&self, user: UserId) -> Result<(StreakState, Option<u64>), EngineError> {
        Ok(match self.store.load_streak(user).map_err(store_err)? {
            Some(stored) => (stored.value, Some(stored.version)),
            None => (StreakState::default(), None),
        })
    }
}
