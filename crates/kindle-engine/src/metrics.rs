//! Metrics collection for streak engine operations

/// Counters collected by the streak engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncMetrics {
    /// Sync calls completed
    pub syncs: usize,

    /// Syncs that found no active habit and wrote nothing
    pub rest_days: usize,

    /// Streak documents persisted
    pub writes: usize,

    /// Syncs that found nothing to persist
    pub skipped_writes: usize,

    /// Freezes paid out at milestones
    pub freezes_awarded: usize,

    /// Times a broken streak cleared the awarded milestones
    pub milestone_resets: usize,

    /// Freezes spent on recovery
    pub freezes_spent: usize,
}

impl SyncMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed sync call
    pub fn record_sync(&mut self) {
        self.syncs += 1;
    }

    /// Record a rest-day no-op
    pub fn record_rest_day(&mut self) {
        self.rest_days += 1;
    }

    /// Record a persisted document
    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    /// Record a sync with nothing to persist
    pub fn record_skipped_write(&mut self) {
        self.skipped_writes += 1;
    }

    /// Record a milestone payout
    pub fn record_award(&mut self) {
        self.freezes_awarded += 1;
    }

    /// Record a milestone reset
    pub fn record_reset(&mut self) {
        self.milestone_resets += 1;
    }

    /// Record freezes spent on one recovery
    pub fn record_spend(&mut self, count: u32) {
        self.freezes_spent += count as usize;
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        [
            "Streak Engine Metrics".to_string(),
            "=====================".to_string(),
            format!("Syncs: {}", self.syncs),
            format!("  Rest days: {}", self.rest_days),
            format!("  Writes: {}", self.writes),
            format!("  Skipped writes: {}", self.skipped_writes),
            String::new(),
            "Freeze economy:".to_string(),
            format!("  Awarded: {}", self.freezes_awarded),
            format!("  Spent: {}", self.freezes_spent),
            format!("  Milestone resets: {}", self.milestone_resets),
        ]
        .join("\n")
    }
}
