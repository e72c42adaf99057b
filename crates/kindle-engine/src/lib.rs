//! Kindle Engine
//!
//! The streak consistency engine: turns a user's habit ledgers into a
//! derived streak state and keeps it correct under repeated, retroactive and
//! concurrent updates.
//!
//! # Overview
//!
//! - **[`StreakSyncService`]**: the single writer of a user's streak state.
//!   Classifies today, updates the full/ember day sets, recounts, pays out
//!   milestone freezes and persists only what changed.
//! - **Freeze recovery**: plans and spends freezes to bridge a gap behind
//!   the current streak.
//! - **[`HabitService`]**: habit create/toggle/edit/delete, each followed by
//!   a sync under the owner's lock.
//! - **[`GroupService`]**: groups and the independent group streak.
//! - **[`SyncMetrics`]**: counters for monitoring.
//!
//! # Usage
//!
//! ```no_run
//! use kindle_domain::{NewHabit, SystemClock, User};
//! use kindle_domain::traits::UserStore;
//! use kindle_engine::{EngineConfig, HabitService, StreakSyncService};
//! use kindle_store::SqliteStore;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(SqliteStore::new("kindle.db")?);
//! let engine = Arc::new(StreakSyncService::new(
//!     store.clone(),
//!     EngineConfig::default(),
//!     Arc::new(SystemClock),
//! )?);
//!
//! let user = User::new("Asha", engine.anchor().now());
//! store.insert_user(&user)?;
//!
//! let habits = HabitService::new(engine.clone());
//! let (habit, _) = habits.create_habit(user.id, NewHabit::daily("Read"))?;
//! let outcome = habits.toggle_completion(user.id, habit.id, None)?;
//! println!("streak: {}", outcome.snapshot.streak);
//! println!("\n{}", engine.metrics().summary());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [engine]
//! utc_offset_minutes = 330
//! milestone_interval_days = 7
//! recovery_scan_limit_days = 30
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod groups;
mod habits;
mod locks;
mod metrics;
mod sync;

#[cfg(test)]
mod mock;

pub use config::EngineConfig;
pub use error::EngineError;
pub use groups::GroupService;
pub use habits::{HabitService, HabitView, ToggleOutcome};
pub use metrics::SyncMetrics;
pub use sync::{Recount, StreakSyncService};

use kindle_domain::traits::{GroupStore, HabitStore, StreakStore, UserStore};

/// Everything the engine needs from a storage backend
pub trait EngineStore: UserStore + HabitStore + StreakStore + GroupStore + Send + Sync {}

impl<T> EngineStore for T where T: UserStore + HabitStore + StreakStore + GroupStore + Send + Sync {}
