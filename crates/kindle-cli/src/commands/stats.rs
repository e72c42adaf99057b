//! Stats command implementation.

use crate::app::App;
use crate::error::Result;
use crate::output::Formatter;
use kindle_domain::traits::UserStore;

/// Sync every user, then report the engine counters.
///
/// A user whose sync fails is reported and skipped.
pub fn execute_stats(app: &App, formatter: &Formatter) -> Result<()> {
    let users = app.store.list_users()?;
    let mut failed = 0;
    for user in &users {
        if let Err(e) = app.engine.sync(user.id) {
            tracing::warn!(user = %user.id, error = %e, "Sync failed");
            failed += 1;
        }
    }

    let metrics = app.engine.metrics();
    if formatter.is_json() {
        let report = serde_json::json!({
            "users": users.len(),
            "failed": failed,
            "syncs": metrics.syncs,
            "restDays": metrics.rest_days,
            "writes": metrics.writes,
            "skippedWrites": metrics.skipped_writes,
            "freezesAwarded": metrics.freezes_awarded,
            "milestoneResets": metrics.milestone_resets,
            "freezesSpent": metrics.freezes_spent,
        });
        println!("{}", formatter.json(&report)?);
    } else {
        println!("Users: {} ({} failed)\n", users.len(), failed);
        println!("{}", metrics.summary());
    }
    Ok(())
}
