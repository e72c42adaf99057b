//! Wiring of store, engine and services for one CLI invocation.

use crate::error::{CliError, Result};
use kindle_domain::traits::UserStore;
use kindle_domain::{SystemClock, UserId};
use kindle_engine::{EngineConfig, EngineError, GroupService, HabitService, StreakSyncService};
use kindle_store::SqliteStore;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Opened database and the services built on it.
pub struct App {
    /// Storage backend
    pub store: Arc<SqliteStore>,

    /// Streak engine
    pub engine: Arc<StreakSyncService<SqliteStore>>,

    /// Habit lifecycle
    pub habits: HabitService<SqliteStore>,

    /// Groups
    pub groups: GroupService<SqliteStore>,

    selector: Option<String>,
}

impl App {
    /// Open the database at `db` and build the services.
    ///
    /// `selector` names the user that user-scoped commands act for.
    pub fn open(db: &Path, engine_config: EngineConfig, selector: Option<String>) -> Result<Self> {
        if let Some(parent) = db.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let store = Arc::new(SqliteStore::new(db)?);
        let engine = Arc::new(StreakSyncService::new(
            store.clone(),
            engine_config,
            Arc::new(SystemClock),
        )?);
        tracing::debug!(db = %db.display(), "Database opened");

        Ok(Self {
            habits: HabitService::new(engine.clone()),
            groups: GroupService::new(engine.clone()),
            store,
            engine,
            selector,
        })
    }

    /// The user selected by `--user` or the config file.
    pub fn active_user(&self) -> Result<UserId> {
        let selector = self.selector.as_deref().ok_or(CliError::NoActiveUser)?;
        self.find_user(selector)
    }

    /// Look a user up by id, or by name when the selector is not an id.
    pub fn find_user(&self, selector: &str) -> Result<UserId> {
        if let Ok(id) = selector.parse::<UserId>() {
            if self.store.get_user(id)?.is_some() {
                return Ok(id);
            }
        }

        let matches: Vec<UserId> = self
            .store
            .list_users()?
            .into_iter()
            .filter(|u| u.name.eq_ignore_ascii_case(selector))
            .map(|u| u.id)
            .collect();

        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(EngineError::NotFound(format!("user {}", selector)).into()),
            _ => Err(CliError::InvalidInput(format!(
                "more than one user is named '{}'; use the id",
                selector
            ))),
        }
    }
}
