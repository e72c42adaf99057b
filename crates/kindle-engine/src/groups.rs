//! Groups and the group streak
//!
//! Groups only read habit ledgers; they never touch a member's streak
//! state. The group streak is its own small state machine
//! ([`GroupStreak`](kindle_domain::GroupStreak)).
//!
//! Linking a habit writes only its group link column, under the owner's
//! lock, so it cannot race a completion toggle.

use crate::error::store_err;
use crate::{EngineError, EngineStore, StreakSyncService};
use kindle_domain::{Group, GroupId, HabitId, UserId};
use std::sync::Arc;

/// Manages groups, their linked habits and the group streak
pub struct GroupService<S> {
    engine: Arc<StreakSyncService<S>>,
}

impl<S: EngineStore> GroupService<S> {
    /// Create a group service sharing `engine`'s store, clock and user locks
    pub fn new(engine: Arc<StreakSyncService<S>>) -> Self {
        Self { engine }
    }

    /// Create a group with `owner` as its first member
    pub fn create_group(&self, owner: UserId, name: &str) -> Result<Group, EngineError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::Validation("group name must not be empty".to_string()));
        }
        self.engine.require_user(owner)?;

        let group = Group::new(name.to_string(), owner, self.engine.anchor().now());
        self.store().insert_group(&group).map_err(store_err)?;
        tracing::info!(group = %group.id, owner = %owner, "Group created");
        Ok(group)
    }

    /// Add `user` to a group. Joining twice is a no-op.
    pub fn join_group(&self, group: GroupId, user: UserId) -> Result<Group, EngineError> {
        self.engine.require_user(user)?;
        let mut stored = self.get_group(group)?;
        if stored.add_member(user) {
            self.store().update_group(&stored).map_err(store_err)?;
            tracing::info!(group = %group, user = %user, "Member joined group");
        }
        Ok(stored)
    }

    /// Make `habit` the member's contribution to the group streak
    ///
    /// A habit counts toward one group at a time and a member contributes
    /// one habit per group. Whatever link this replaces is cleared on both
    /// the group and the habit side.
    pub fn link_habit(&self, group: GroupId, user: UserId, habit: HabitId) -> Result<Group, EngineError> {
        let _guard = self.engine.lock_user(user);
        let mut stored = self.get_group(group)?;
        if !stored.is_member(user) {
            return Err(EngineError::Validation(format!(
                "user {} is not a member of group {}",
                user, group
            )));
        }
        let linked = match self.store().get_habit(habit).map_err(store_err)? {
            Some(h) if h.user_id == user => h,
            _ => return Err(EngineError::NotFound(format!("habit {}", habit))),
        };

        if let Some(previous) = linked.group_link.filter(|g| *g != group) {
            if let Some(mut old) = self.store().get_group(previous).map_err(store_err)? {
                if old.unlink_habit(habit) > 0 {
                    self.store().update_group(&old).map_err(store_err)?;
                }
            }
        }

        if let Some(replaced) = stored.linked_habit_of(user).filter(|h| *h != habit) {
            let still_points_here = self
                .store()
                .get_habit(replaced)
                .map_err(store_err)?
                .is_some_and(|h| h.group_link == Some(group));
            if still_points_here {
                self.store().set_group_link(replaced, None).map_err(store_err)?;
            }
            tracing::debug!(group = %group, user = %user, habit = %replaced, "Replaced habit unlinked");
        }

        stored.link_habit(user, habit);
        self.store().update_group(&stored).map_err(store_err)?;
        if !self.store().set_group_link(habit, Some(group)).map_err(store_err)? {
            return Err(EngineError::NotFound(format!("habit {}", habit)));
        }
        tracing::info!(group = %group, user = %user, habit = %habit, "Habit linked to group");
        Ok(stored)
    }

    /// Re-evaluate the group streak for today
    ///
    /// The day counts when at least one habit is linked and every linked
    /// habit was completed today.
    pub fn refresh_group_streak(&self, group: GroupId) -> Result<Group, EngineError> {
        let mut stored = self.get_group(group)?;
        let today = self.engine.anchor().today();

        let linked = stored.linked_habits();
        let mut all_done = !linked.is_empty();
        for id in &linked {
            let done = self
                .store()
                .get_habit(*id)
                .map_err(store_err)?
                .is_some_and(|h| h.is_completed_on(today));
            if !done {
                all_done = false;
                break;
            }
        }

        if stored.streak.refresh(today, all_done) {
            self.store().update_group(&stored).map_err(store_err)?;
            tracing::debug!(
                group = %group,
                streak = stored.streak.group_streak,
                "Group streak updated"
            );
        }
        Ok(stored)
    }

    /// Get a group by ID
    pub fn get_group(&self, group: GroupId) -> Result<Group, EngineError> {
        self.store()
            .get_group(group)
            .map_err(store_err)?
            .ok_or_else(|| EngineError::NotFound(format!("group {}", group)))
    }

    /// All groups, oldest first
    pub fn list_groups(&self) -> Result<Vec<Group>, EngineError> {
        self.store().list_groups().map_err(store_err)
    }

    fn store(&self) -> &S {
        self.engine.store()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockStore;
    use crate::EngineConfig;
    use kindle_domain::traits::{HabitStore, UserStore};
    use kindle_domain::{CivilDate, Clock, Habit, ManualClock, NewHabit, User};

    fn date(s: &str) -> CivilDate {
        s.parse().unwrap()
    }

    struct Fixture {
        store: Arc<MockStore>,
        clock: Arc<ManualClock>,
        groups: GroupService<MockStore>,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MockStore::new());
            let clock = Arc::new(ManualClock::at_civil_noon(date("2024-01-10"), 330));
            let engine =
                StreakSyncService::new(store.clone(), EngineConfig::default(), clock.clone()).unwrap();
            Self {
                groups: GroupService::new(Arc::new(engine)),
                store,
                clock,
            }
        }

        fn user(&self, name: &str) -> UserId {
            let user = User::new(name, self.clock.now());
            self.store.insert_user(&user).unwrap();
            user.id
        }

        fn habit(&self, user: UserId) -> Habit {
            let habit = Habit::new(user, NewHabit::daily("Run"), self.clock.now()).unwrap();
            self.store.insert_habit(&habit).unwrap();
            habit
        }

        fn complete(&self, habit: &Habit, day: &str) {
            assert_eq!(self.store.toggle_completion(habit.id, date(day)).unwrap(), Some(true));
        }

        fn link_of(&self, habit: &Habit) -> Option<GroupId> {
            self.store.get_habit(habit.id).unwrap().unwrap().group_link
        }
    }

    #[test]
    fn test_create_and_join() {
        let fx = Fixture::new();
        let owner = fx.user("Asha");
        let friend = fx.user("Ravi");

        assert!(matches!(
            fx.groups.create_group(owner, "  "),
            Err(EngineError::Validation(_))
        ));

        let group = fx.groups.create_group(owner, "Runners").unwrap();
        let joined = fx.groups.join_group(group.id, friend).unwrap();
        assert_eq!(joined.members.len(), 2);

        let again = fx.groups.join_group(group.id, friend).unwrap();
        assert_eq!(again.members.len(), 2);

        assert!(matches!(
            fx.groups.join_group(GroupId::new(), friend),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn test_link_requires_membership_and_ownership() {
        let fx = Fixture::new();
        let owner = fx.user("Asha");
        let outsider = fx.user("Meera");
        let group = fx.groups.create_group(owner, "Runners").unwrap();
        let outsider_habit = fx.habit(outsider);

        assert!(matches!(
            fx.groups.link_habit(group.id, outsider, outsider_habit.id),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            fx.groups.link_habit(group.id, owner, outsider_habit.id),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn test_relinking_moves_habit_between_groups() {
        let fx = Fixture::new();
        let owner = fx.user("Asha");
        let habit = fx.habit(owner);
        let first = fx.groups.create_group(owner, "A").unwrap();
        let second = fx.groups.create_group(owner, "B").unwrap();

        fx.groups.link_habit(first.id, owner, habit.id).unwrap();
        fx.groups.link_habit(second.id, owner, habit.id).unwrap();

        assert!(fx.groups.get_group(first.id).unwrap().linked_habits().is_empty());
        assert_eq!(fx.groups.get_group(second.id).unwrap().linked_habits(), vec![habit.id]);
        assert_eq!(fx.link_of(&habit), Some(second.id));
    }

    #[test]
    fn test_relinking_within_a_group_clears_the_replaced_habit() {
        let fx = Fixture::new();
        let owner = fx.user("Asha");
        let first = fx.habit(owner);
        let second = fx.habit(owner);
        let group = fx.groups.create_group(owner, "Runners").unwrap();

        fx.groups.link_habit(group.id, owner, first.id).unwrap();
        let relinked = fx.groups.link_habit(group.id, owner, second.id).unwrap();

        assert_eq!(relinked.linked_habits(), vec![second.id]);
        assert_eq!(fx.link_of(&first), None);
        assert_eq!(fx.link_of(&second), Some(group.id));

        // Linking the same habit again changes nothing
        fx.groups.link_habit(group.id, owner, second.id).unwrap();
        assert_eq!(fx.link_of(&second), Some(group.id));
        assert_eq!(fx.groups.get_group(group.id).unwrap().linked_habits(), vec![second.id]);
    }

    #[test]
    fn test_link_keeps_completions() {
        let fx = Fixture::new();
        let owner = fx.user("Asha");
        let habit = fx.habit(owner);
        let group = fx.groups.create_group(owner, "Runners").unwrap();
        fx.complete(&habit, "2024-01-09");

        fx.groups.link_habit(group.id, owner, habit.id).unwrap();

        let stored = fx.store.get_habit(habit.id).unwrap().unwrap();
        assert!(stored.is_completed_on(date("2024-01-09")));
        assert_eq!(stored.group_link, Some(group.id));
    }

    #[test]
    fn test_group_streak_needs_every_linked_habit() {
        let fx = Fixture::new();
        let owner = fx.user("Asha");
        let friend = fx.user("Ravi");
        let group = fx.groups.create_group(owner, "Runners").unwrap();
        fx.groups.join_group(group.id, friend).unwrap();

        // Nothing linked yet
        let refreshed = fx.groups.refresh_group_streak(group.id).unwrap();
        assert_eq!(refreshed.streak.group_streak, 0);

        let mine = fx.habit(owner);
        let theirs = fx.habit(friend);
        fx.groups.link_habit(group.id, owner, mine.id).unwrap();
        fx.groups.link_habit(group.id, friend, theirs.id).unwrap();

        fx.complete(&mine, "2024-01-10");
        assert_eq!(fx.groups.refresh_group_streak(group.id).unwrap().streak.group_streak, 0);

        fx.complete(&theirs, "2024-01-10");
        let refreshed = fx.groups.refresh_group_streak(group.id).unwrap();
        assert_eq!(refreshed.streak.group_streak, 1);
        assert_eq!(refreshed.streak.last_completed_date_ist, Some(date("2024-01-10")));

        // Same day again does not double count
        assert_eq!(fx.groups.refresh_group_streak(group.id).unwrap().streak.group_streak, 1);
    }

    #[test]
    fn test_group_streak_resets_after_missed_day() {
        let fx = Fixture::new();
        let owner = fx.user("Asha");
        let habit = fx.habit(owner);
        let group = fx.groups.create_group(owner, "Solo").unwrap();
        fx.groups.link_habit(group.id, owner, habit.id).unwrap();

        fx.complete(&habit, "2024-01-10");
        assert_eq!(fx.groups.refresh_group_streak(group.id).unwrap().streak.group_streak, 1);

        fx.clock.advance_days(1);
        fx.complete(&habit, "2024-01-11");
        assert_eq!(fx.groups.refresh_group_streak(group.id).unwrap().streak.group_streak, 2);

        fx.clock.advance_days(2);
        let refreshed = fx.groups.refresh_group_streak(group.id).unwrap();
        assert_eq!(refreshed.streak.group_streak, 0);
    }
}
