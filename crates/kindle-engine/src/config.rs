//! Configuration for the streak engine
//!
//! Defines the civil timezone, the milestone interval and the recovery scan
//! window.

use crate::EngineError;
use kindle_domain::{Clock, TimeAnchor, RECOVERY_SCAN_LIMIT_DAYS};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Largest timezone offset accepted, in minutes (UTC±14:00)
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Configuration for the streak engine
///
/// # Examples
///
/// ```
/// use kindle_engine::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.utc_offset_minutes, 330);
/// assert_eq!(config.milestone_interval_days, 7);
///
/// let config = EngineConfig::from_toml_str("milestone_interval_days = 10").unwrap();
/// assert_eq!(config.milestone_interval_days, 10);
/// assert_eq!(config.recovery_scan_limit_days, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Offset of the civil timezone from UTC, in minutes
    /// Default: 330 (IST, UTC+05:30)
    pub utc_offset_minutes: i32,

    /// Streak length that pays out one freeze
    /// Default: 7 days
    pub milestone_interval_days: u32,

    /// Days examined behind the intact streak tail when planning recovery
    /// Default: 30 days
    pub recovery_scan_limit_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: TimeAnchor::IST_OFFSET_MINUTES,
            milestone_interval_days: 7,
            recovery_scan_limit_days: RECOVERY_SCAN_LIMIT_DAYS,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is in range
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&self.utc_offset_minutes) {
            return Err(EngineError::Config(format!(
                "utc_offset_minutes must be within ±{}, got {}",
                MAX_OFFSET_MINUTES, self.utc_offset_minutes
            )));
        }
        if self.milestone_interval_days == 0 {
            return Err(EngineError::Config(
                "milestone_interval_days must be at least 1".to_string(),
            ));
        }
        if self.recovery_scan_limit_days == 0 {
            return Err(EngineError::Config(
                "recovery_scan_limit_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the time anchor for the configured timezone
    pub fn anchor(&self, clock: Arc<dyn Clock>) -> Result<TimeAnchor, EngineError> {
        self.validate()?;
        TimeAnchor::new(self.utc_offset_minutes, clock).map_err(|e| EngineError::Config(e.to_string()))
    }
}
