//! Kindle Domain Layer
//!
//! This crate contains the streak consistency engine's domain model and the
//! pure functions the engine is built from. It performs no I/O: persistence
//! lives in `kindle-store`, orchestration in `kindle-engine`.
//!
//! ## Key Concepts
//!
//! - **Civil date**: a calendar day in one fixed timezone, produced by [`TimeAnchor`]
//! - **Habit**: a user's habit and its completion ledger
//! - **Daily classification**: Full / Partial / None for a day's active habits
//! - **Streak state**: full days, ember days, frozen days and the freeze economy
//! - **Streak counter / recovery planner**: pure derivations over the day sets
//! - **Group streak**: a small, independent state machine for squads
//!
//! ## Architecture
//!
//! - Pure business logic only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all storage interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod calendar;
pub mod classifier;
pub mod counter;
pub mod error;
pub mod group;
pub mod habit;
pub mod ids;
pub mod recovery;
pub mod streak;
pub mod traits;
pub mod user;

// Re-exports for convenience
pub use calendar::{CivilDate, Clock, ManualClock, SystemClock, TimeAnchor};
pub use classifier::{classify, Classification, DailyProgress, DayClass};
pub use counter::{count_ledger, count_streak};
pub use error::DomainError;
pub use group::{Group, GroupMember, GroupStreak};
pub use habit::{Habit, HabitKind, HabitPatch, NewHabit, Visibility};
pub use ids::{GroupId, HabitId, UserId};
pub use recovery::{plan_recovery, RecoveryPlan, RECOVERY_SCAN_LIMIT_DAYS};
pub use streak::{DayLedger, StreakClass, StreakSnapshot, StreakState};
pub use user::User;
