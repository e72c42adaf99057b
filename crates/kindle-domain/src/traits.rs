//! Trait definitions for storage interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.
//!
//! Methods take `&self`: implementations are shared between threads and
//! handle their own interior locking.

use crate::{CivilDate, Group, GroupId, Habit, HabitId, StreakState, User, UserId};

/// Error of a storage backend
pub trait StoreFailure: std::fmt::Display {
    /// Whether a versioned write lost a race with another writer
    ///
    /// Such a write changed nothing and may be retried from a fresh read.
    fn is_conflict(&self) -> bool;
}

/// Common error type of a storage backend
pub trait Repository {
    /// Error type for store operations
    type Error: StoreFailure;
}

/// A stored value together with its optimistic-concurrency version
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    /// Version the value was read at
    pub version: u64,

    /// The value
    pub value: T,
}

/// Storage for users
pub trait UserStore: Repository {
    /// Insert a new user
    fn insert_user(&self, user: &User) -> Result<(), Self::Error>;

    /// Get a user by ID
    fn get_user(&self, id: UserId) -> Result<Option<User>, Self::Error>;

    /// All users, oldest first
    fn list_users(&self) -> Result<Vec<User>, Self::Error>;
}

/// Storage for habits and their completion ledgers
///
/// Implemented by the infrastructure layer (kindle-store)
pub trait HabitStore: Repository {
    /// Insert a new habit
    fn insert_habit(&self, habit: &Habit) -> Result<(), Self::Error>;

    /// Write a habit's editable fields
    ///
    /// The completion ledger and the group link are left as stored; they
    /// only change through [`toggle_completion`](Self::toggle_completion)
    /// and [`set_group_link`](Self::set_group_link), so an edit made from a
    /// stale read never drops a completion.
    fn update_habit(&self, habit: &Habit) -> Result<(), Self::Error>;

    /// Flip the ledger entry for `day` as one atomic read-modify-write
    ///
    /// Returns the new completion flag, or `None` if the habit does not exist.
    fn toggle_completion(&self, habit: HabitId, day: CivilDate) -> Result<Option<bool>, Self::Error>;

    /// Set or clear the group a habit is linked to. Returns false if the
    /// habit does not exist.
    fn set_group_link(&self, habit: HabitId, group: Option<GroupId>) -> Result<bool, Self::Error>;

    /// Get a habit by ID
    fn get_habit(&self, id: HabitId) -> Result<Option<Habit>, Self::Error>;

    /// All habits of a user, oldest first
    fn habits_for_user(&self, user: UserId) -> Result<Vec<Habit>, Self::Error>;

    /// Delete a habit. Returns false if it did not exist.
    fn delete_habit(&self, id: HabitId) -> Result<bool, Self::Error>;
}

/// Storage for per-user streak state documents
pub trait StreakStore: Repository {
    /// Load a user's streak state, if one was ever written
    fn load_streak(&self, user: UserId) -> Result<Option<Versioned<StreakState>>, Self::Error>;

    /// Write a user's streak state as one document
    ///
    /// `expected_version` is the version the state was read at, or `None`
    /// when creating it. A mismatch is a write conflict and writes nothing.
    /// Returns the new version.
    fn save_streak(
        &self,
        user: UserId,
        state: &StreakState,
        expected_version: Option<u64>,
    ) -> Result<u64, Self::Error>;
}

/// Storage for groups, their members and the group streak
pub trait GroupStore: Repository {
    /// Insert a new group with its members
    fn insert_group(&self, group: &Group) -> Result<(), Self::Error>;

    /// Replace a stored group's name, members and streak
    fn update_group(&self, group: &Group) -> Result<(), Self::Error>;

    /// Get a group by ID
    fn get_group(&self, id: GroupId) -> Result<Option<Group>, Self::Error>;

    /// All groups, oldest first
    fn list_groups(&self) -> Result<Vec<Group>, Self::Error>;

    /// Clear every member link pointing at `habit`. Returns how many were cleared.
    fn remove_habit_links(&self, habit: HabitId) -> Result<usize, Self::Error>;
}
