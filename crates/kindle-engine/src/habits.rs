//! Habit lifecycle
//!
//! Every habit mutation is followed by a sync of the owner's streak while
//! the owner's lock is still held, so the streak always reflects the ledger
//! the user just wrote.

use crate::error::store_err;
use crate::{EngineError, EngineStore, StreakSyncService};
use kindle_domain::{CivilDate, Habit, HabitId, HabitPatch, NewHabit, StreakSnapshot, UserId};
use serde::Serialize;
use std::sync::Arc;

/// Result of flipping one ledger entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    /// Day that was toggled
    pub date: CivilDate,

    /// Whether the day is now completed
    pub completed: bool,

    /// Streak after the toggle
    pub snapshot: StreakSnapshot,
}

/// A habit annotated for one day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitView {
    /// The habit
    #[serde(flatten)]
    pub habit: Habit,

    /// Counted toward the day's classification
    pub active: bool,

    /// Completion count reached the duration target
    pub finished: bool,

    /// Completed on the day
    pub completed: bool,
}

/// Creates, edits, toggles and deletes habits on behalf of their owner
pub struct HabitService<S> {
    engine: Arc<StreakSyncService<S>>,
}

impl<S: EngineStore> HabitService<S> {
    /// Create a habit service that syncs through `engine`
    pub fn new(engine: Arc<StreakSyncService<S>>) -> Self {
        Self { engine }
    }

    /// Validate and store a new habit, then sync
    pub fn create_habit(
        &self,
        user: UserId,
        input: NewHabit,
    ) -> Result<(Habit, StreakSnapshot), EngineError> {
        let _guard = self.engine.lock_user(user);
        self.engine.require_user(user)?;

        let habit = Habit::new(user, input, self.engine.anchor().now())?;
        self.engine.store().insert_habit(&habit).map_err(store_err)?;
        tracing::info!(user = %user, habit = %habit.id, name = %habit.name, "Habit created");

        let snapshot = self.engine.sync_locked(user)?;
        Ok((habit, snapshot))
    }

    /// Flip `habit`'s ledger entry for `date` (today when omitted), then sync
    ///
    /// Past dates are accepted and stored; only today's entry moves the
    /// streak. Future dates are rejected.
    pub fn toggle_completion(
        &self,
        user: UserId,
        habit: HabitId,
        date: Option<CivilDate>,
    ) -> Result<ToggleOutcome, EngineError> {
        let today = self.engine.anchor().today();
        let date = date.unwrap_or(today);
        if date > today {
            return Err(EngineError::Validation(format!(
                "cannot complete a habit on {} (today is {})",
                date, today
            )));
        }

        let _guard = self.engine.lock_user(user);
        self.owned_habit(user, habit)?;
        let completed = self
            .engine
            .store()
            .toggle_completion(habit, date)
            .map_err(store_err)?
            .ok_or_else(|| EngineError::NotFound(format!("habit {}", habit)))?;
        tracing::debug!(user = %user, habit = %habit, %date, completed, "Habit toggled");

        let snapshot = self.engine.sync_locked(user)?;
        Ok(ToggleOutcome {
            date,
            completed,
            snapshot,
        })
    }

    /// Edit a habit's settings, then sync
    ///
    /// The ledger and group link are not part of an edit and are never
    /// written here.
    pub fn update_habit(
        &self,
        user: UserId,
        habit: HabitId,
        patch: HabitPatch,
    ) -> Result<(Habit, StreakSnapshot), EngineError> {
        let _guard = self.engine.lock_user(user);
        let mut stored = self.owned_habit(user, habit)?;
        stored.apply_patch(patch)?;
        self.engine.store().update_habit(&stored).map_err(store_err)?;
        tracing::info!(user = %user, habit = %habit, "Habit updated");

        let snapshot = self.engine.sync_locked(user)?;
        Ok((stored, snapshot))
    }

    /// Delete a habit and every group link to it, then sync
    pub fn delete_habit(&self, user: UserId, habit: HabitId) -> Result<StreakSnapshot, EngineError> {
        let _guard = self.engine.lock_user(user);
        self.owned_habit(user, habit)?;

        let unlinked = self
            .engine
            .store()
            .remove_habit_links(habit)
            .map_err(store_err)?;
        self.engine.store().delete_habit(habit).map_err(store_err)?;
        tracing::info!(user = %user, habit = %habit, unlinked, "Habit deleted");

        self.engine.sync_locked(user)
    }

    /// A user's habits annotated for `day` (today when omitted)
    pub fn list_habits(
        &self,
        user: UserId,
        day: Option<CivilDate>,
    ) -> Result<Vec<HabitView>, EngineError> {
        self.engine.require_user(user)?;
        let day = day.unwrap_or_else(|| self.engine.anchor().today());
        let habits = self.engine.store().habits_for_user(user).map_err(store_err)?;

        Ok(habits
            .into_iter()
            .map(|habit| HabitView {
                active: habit.is_active_on(day),
                finished: habit.is_finished(),
                completed: habit.is_completed_on(day),
                habit,
            })
            .collect())
    }

    /// Load `habit`, treating another user's habit as missing
    fn owned_habit(&self, user: UserId, habit: HabitId) -> Result<Habit, EngineError> {
        match self.engine.store().get_habit(habit).map_err(store_err)? {
            Some(h) if h.user_id == user => Ok(h),
            _ => Err(EngineError::NotFound(format!("habit {}", habit))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockStore;
    use crate::EngineConfig;
    use kindle_domain::traits::{GroupStore, HabitStore, UserStore};
    use kindle_domain::{Clock, Group, ManualClock, StreakClass, User};

    fn date(s: &str) -> CivilDate {
        s.parse().unwrap()
    }

    /// 2024-01-10 is a Wednesday
    const TODAY: &str = "2024-01-10";

    fn setup() -> (Arc<MockStore>, HabitService<MockStore>, UserId) {
        let store = Arc::new(MockStore::new());
        let clock = Arc::new(ManualClock::at_civil_noon(date(TODAY), 330));
        let user = User::new("Asha", clock.now());
        store.insert_user(&user).unwrap();
        let engine = StreakSyncService::new(store.clone(), EngineConfig::default(), clock).unwrap();
        (store, HabitService::new(Arc::new(engine)), user.id)
    }

    #[test]
    fn test_create_habit_syncs() {
        let (store, habits, user) = setup();
        let (habit, snapshot) = habits.create_habit(user, NewHabit::daily("Read")).unwrap();

        assert_eq!(snapshot.total_habits, 1);
        assert_eq!(snapshot.streak_state, StreakClass::Extinguished);
        assert!(store.get_habit(habit.id).unwrap().is_some());
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let (_, habits, user) = setup();
        let result = habits.create_habit(user, NewHabit::daily("   "));
        assert!(matches!(result, Err(EngineError::Validation(_))));

        let result = habits.create_habit(UserId::new(), NewHabit::daily("Read"));
        assert!(matches!(result, Err(EngineError::NotFound(_))));
    }

    #[test]
    fn test_toggle_today_moves_the_streak() {
        let (_, habits, user) = setup();
        let (habit, _) = habits.create_habit(user, NewHabit::daily("Read")).unwrap();

        let outcome = habits.toggle_completion(user, habit.id, None).unwrap();
        assert!(outcome.completed);
        assert_eq!(outcome.date, date(TODAY));
        assert_eq!(outcome.snapshot.streak, 1);
        assert_eq!(outcome.snapshot.streak_state, StreakClass::Active);

        let outcome = habits.toggle_completion(user, habit.id, None).unwrap();
        assert!(!outcome.completed);
        assert_eq!(outcome.snapshot.streak, 0);
    }

    #[test]
    fn test_toggle_past_date_is_stored_but_not_scored() {
        let (store, habits, user) = setup();
        let (habit, _) = habits.create_habit(user, NewHabit::daily("Read")).unwrap();

        let outcome = habits
            .toggle_completion(user, habit.id, Some(date("2024-01-09")))
            .unwrap();

        assert!(outcome.completed);
        assert!(outcome.snapshot.history.is_empty());
        assert!(store
            .get_habit(habit.id)
            .unwrap()
            .unwrap()
            .is_completed_on(date("2024-01-09")));
    }

    #[test]
    fn test_toggle_rejects_future_and_foreign_habits() {
        let (store, habits, user) = setup();
        let (habit, _) = habits.create_habit(user, NewHabit::daily("Read")).unwrap();

        let result = habits.toggle_completion(user, habit.id, Some(date("2024-01-11")));
        assert!(matches!(result, Err(EngineError::Validation(_))));

        let other = User::new("Ravi", habit.created_at);
        store.insert_user(&other).unwrap();
        let result = habits.toggle_completion(other.id, habit.id, None);
        assert!(matches!(result, Err(EngineError::NotFound(_))));
        assert!(!store.get_habit(habit.id).unwrap().unwrap().is_completed_on(date(TODAY)));
    }

    #[test]
    fn test_update_to_rest_day_keeps_streak() {
        let (_, habits, user) = setup();
        let (habit, _) = habits.create_habit(user, NewHabit::daily("Read")).unwrap();
        habits.toggle_completion(user, habit.id, None).unwrap();

        let patch = HabitPatch {
            active_days: Some(vec![6, 7]),
            ..HabitPatch::default()
        };
        let (updated, snapshot) = habits.update_habit(user, habit.id, patch).unwrap();

        assert!(!updated.is_scheduled_on(date(TODAY)));
        assert_eq!(snapshot.total_habits, 0);
        assert_eq!(snapshot.streak, 1);
    }

    #[test]
    fn test_invalid_patch_changes_nothing() {
        let (store, habits, user) = setup();
        let (habit, _) = habits.create_habit(user, NewHabit::daily("Read")).unwrap();

        let patch = HabitPatch {
            name: Some("Read more".to_string()),
            active_days: Some(vec![0]),
            ..HabitPatch::default()
        };
        assert!(matches!(
            habits.update_habit(user, habit.id, patch),
            Err(EngineError::Validation(_))
        ));
        assert_eq!(store.get_habit(habit.id).unwrap().unwrap().name, "Read");
    }

    #[test]
    fn test_delete_unlinks_groups_and_resyncs() {
        let (store, habits, user) = setup();
        let (read, _) = habits.create_habit(user, NewHabit::daily("Read")).unwrap();
        let (walk, _) = habits.create_habit(user, NewHabit::daily("Walk")).unwrap();
        habits.toggle_completion(user, read.id, None).unwrap();

        let mut group = Group::new("Crew".to_string(), user, read.created_at);
        group.link_habit(user, walk.id);
        store.insert_group(&group).unwrap();

        // Read done, Walk not: partial until Walk is gone
        let snapshot = habits.delete_habit(user, walk.id).unwrap();

        assert_eq!(snapshot.streak_state, StreakClass::Active);
        assert_eq!(snapshot.streak, 1);
        assert!(store.get_habit(walk.id).unwrap().is_none());
        assert!(store.get_group(group.id).unwrap().unwrap().linked_habits().is_empty());
    }

    #[test]
    fn test_list_habits_annotates_day() {
        let (_, habits, user) = setup();
        let (read, _) = habits.create_habit(user, NewHabit::daily("Read")).unwrap();
        habits
            .create_habit(
                user,
                NewHabit {
                    active_days: vec![6, 7],
                    ..NewHabit::daily("Hike")
                },
            )
            .unwrap();
        habits.toggle_completion(user, read.id, None).unwrap();

        let views = habits.list_habits(user, None).unwrap();
        assert_eq!(views.len(), 2);

        let read_view = views.iter().find(|v| v.habit.name == "Read").unwrap();
        assert!(read_view.active && read_view.completed && !read_view.finished);

        let hike_view = views.iter().find(|v| v.habit.name == "Hike").unwrap();
        assert!(!hike_view.active);
    }

    #[test]
    fn test_edit_keeps_ledger_written_after_read() {
        let (store, habits, user) = setup();
        let (habit, _) = habits.create_habit(user, NewHabit::daily("Read")).unwrap();

        // A toggle from another process lands after this edit's read
        let stale = store.get_habit(habit.id).unwrap().unwrap();
        store.toggle_completion(habit.id, date(TODAY)).unwrap();
        let mut edited = stale;
        edited.name = "Read more".to_string();
        store.update_habit(&edited).unwrap();

        let patch = HabitPatch {
            goal: Some(20),
            ..HabitPatch::default()
        };
        let (_, snapshot) = habits.update_habit(user, habit.id, patch).unwrap();

        let stored = store.get_habit(habit.id).unwrap().unwrap();
        assert_eq!(stored.name, "Read more");
        assert_eq!(stored.goal, 20);
        assert!(stored.is_completed_on(date(TODAY)));
        assert_eq!(snapshot.streak, 1);
    }

    #[test]
    fn test_views_serialize_flat() {
        let (_, habits, user) = setup();
        let (habit, _) = habits.create_habit(user, NewHabit::daily("Read")).unwrap();
        let outcome = habits.toggle_completion(user, habit.id, None).unwrap();

        let views = habits.list_habits(user, None).unwrap();
        let json = serde_json::to_value(&views[0]).unwrap();
        assert_eq!(json["name"], "Read");
        assert_eq!(json["type"], "build");
        assert_eq!(json["completions"], serde_json::json!([TODAY]));
        assert_eq!(json["active"], true);
        assert_eq!(json["finished"], false);
        assert!(json.get("habit").is_none());

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["date"], TODAY);
        assert_eq!(json["completed"], true);
        assert_eq!(json["snapshot"]["streakState"], "active");
    }
}
