//! Streak command implementation.

use crate::app::App;
use crate::cli::{StreakAction, StreakArgs};
use crate::error::Result;
use crate::output::Formatter;

/// Execute the streak command.
pub fn execute_streak(args: StreakArgs, app: &App, formatter: &Formatter) -> Result<()> {
    let user = app.active_user()?;

    let output = match args.action {
        StreakAction::Show => formatter.format_snapshot(&app.engine.snapshot(user)?)?,
        StreakAction::Sync => formatter.format_snapshot(&app.engine.sync(user)?)?,
        StreakAction::Recount => formatter.format_recount(&app.engine.recount(user)?)?,
    };
    println!("{}", output);
    Ok(())
}
