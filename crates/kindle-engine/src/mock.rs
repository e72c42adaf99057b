//! In-memory store for unit tests
//!
//! Counts streak document writes so tests can observe when a sync chose not
//! to persist, and can lose a streak write to a simulated concurrent writer.

use kindle_domain::traits::{
    GroupStore, HabitStore, Repository, StoreFailure, StreakStore, UserStore, Versioned,
};
use kindle_domain::{CivilDate, Group, GroupId, Habit, HabitId, StreakState, User, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, thiserror::Error)]
pub(crate) enum MockError {
    #[error("missing {0}")]
    Missing(String),
    #[error("version conflict: expected {expected:?}, found {found:?}")]
    Conflict {
        expected: Option<u64>,
        found: Option<u64>,
    },
}

impl StoreFailure for MockError {
    fn is_conflict(&self) -> bool {
        matches!(self, MockError::Conflict { .. })
    }
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    habits: Vec<Habit>,
    streaks: HashMap<UserId, Versioned<StreakState>>,
    groups: Vec<Group>,
}

#[derive(Default)]
pub(crate) struct MockStore {
    tables: Mutex<Tables>,
    streak_writes: AtomicUsize,
    interfering_saves: AtomicUsize,
    lost_saves: AtomicUsize,
}

impl MockStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn streak_writes(&self) -> usize {
        self.streak_writes.load(Ordering::SeqCst)
    }

    /// Make the next `saves` streak saves lose to another writer
    ///
    /// The stored document's version is bumped just before each save checks
    /// it, as if a second process had written in between.
    pub(crate) fn interfere_with_saves(&self, saves: usize) {
        self.interfering_saves.store(saves, Ordering::SeqCst);
    }

    pub(crate) fn lost_saves(&self) -> usize {
        self.lost_saves.load(Ordering::SeqCst)
    }

    /// Overwrite a streak document directly, bypassing version checks
    pub(crate) fn seed_streak(&self, user: UserId, state: StreakState) {
        let mut tables = self.tables();
        let version = tables.streaks.get(&user).map_or(1, |v| v.version + 1);
        tables.streaks.insert(user, Versioned { version, value: state });
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Repository for MockStore {
    type Error = MockError;
}

impl UserStore for MockStore {
    fn insert_user(&self, user: &User) -> Result<(), MockError> {
        self.tables().users.push(user.clone());
        Ok(())
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>, MockError> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    fn list_users(&self) -> Result<Vec<User>, MockError> {
        Ok(self.tables().users.clone())
    }
}

impl HabitStore for MockStore {
    fn insert_habit(&self, habit: &Habit) -> Result<(), MockError> {
        self.tables().habits.push(habit.clone());
        Ok(())
    }

    fn update_habit(&self, habit: &Habit) -> Result<(), MockError> {
        let mut tables = self.tables();
        let slot = tables
            .habits
            .iter_mut()
            .find(|h| h.id == habit.id)
            .ok_or_else(|| MockError::Missing(habit.id.to_string()))?;
        let mut edited = habit.clone();
        edited.completions = std::mem::take(&mut slot.completions);
        edited.group_link = slot.group_link;
        *slot = edited;
        Ok(())
    }

    fn toggle_completion(&self, habit: HabitId, day: CivilDate) -> Result<Option<bool>, MockError> {
        Ok(self
            .tables()
            .habits
            .iter_mut()
            .find(|h| h.id == habit)
            .map(|h| h.toggle_completion(day)))
    }

    fn set_group_link(&self, habit: HabitId, group: Option<GroupId>) -> Result<bool, MockError> {
        match self.tables().habits.iter_mut().find(|h| h.id == habit) {
            Some(h) => {
                h.group_link = group;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn get_habit(&self, id: HabitId) -> Result<Option<Habit>, MockError> {
        Ok(self.tables().habits.iter().find(|h| h.id == id).cloned())
    }

    fn habits_for_user(&self, user: UserId) -> Result<Vec<Habit>, MockError> {
        Ok(self
            .tables()
            .habits
            .iter()
            .filter(|h| h.user_id == user)
            .cloned()
            .collect())
    }

    fn delete_habit(&self, id: HabitId) -> Result<bool, MockError> {
        let mut tables = self.tables();
        let before = tables.habits.len();
        tables.habits.retain(|h| h.id != id);
        Ok(tables.habits.len() != before)
    }
}

impl StreakStore for MockStore {
    fn load_streak(&self, user: UserId) -> Result<Option<Versioned<StreakState>>, MockError> {
        Ok(self.tables().streaks.get(&user).cloned())
    }

    fn save_streak(
        &self,
        user: UserId,
        state: &StreakState,
        expected_version: Option<u64>,
    ) -> Result<u64, MockError> {
        let mut tables = self.tables();
        let interfere = self
            .interfering_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if interfere {
            if let Some(stored) = tables.streaks.get_mut(&user) {
                stored.version += 1;
            }
        }
        let found = tables.streaks.get(&user).map(|v| v.version);
        if found != expected_version {
            self.lost_saves.fetch_add(1, Ordering::SeqCst);
            return Err(MockError::Conflict {
                expected: expected_version,
                found,
            });
        }
        let version = found.map_or(1, |v| v + 1);
        tables.streaks.insert(
            user,
            Versioned {
                version,
                value: state.clone(),
            },
        );
        self.streak_writes.fetch_add(1, Ordering::SeqCst);
        Ok(version)
    }
}

impl GroupStore for MockStore {
    fn insert_group(&self, group: &Group) -> Result<(), MockError> {
        self.tables().groups.push(group.clone());
        Ok(())
    }

    fn update_group(&self, group: &Group) -> Result<(), MockError> {
        let mut tables = self.tables();
        let slot = tables
            .groups
            .iter_mut()
            .find(|g| g.id == group.id)
            .ok_or_else(|| MockError::Missing(group.id.to_string()))?;
        *slot = group.clone();
        Ok(())
    }

    fn get_group(&self, id: GroupId) -> Result<Option<Group>, MockError> {
        Ok(self.tables().groups.iter().find(|g| g.id == id).cloned())
    }

    fn list_groups(&self) -> Result<Vec<Group>, MockError> {
        Ok(self.tables().groups.clone())
    }

    fn remove_habit_links(&self, habit: HabitId) -> Result<usize, MockError> {
        Ok(self
            .tables()
            .groups
            .iter_mut()
            .map(|g| g.unlink_habit(habit))
            .sum())
    }
}
