//! Freeze command implementation.

use crate::app::App;
use crate::cli::{FreezeAction, FreezeArgs};
use crate::error::Result;
use crate::output::Formatter;

/// Execute the freeze command.
pub fn execute_freeze(args: FreezeArgs, app: &App, formatter: &Formatter) -> Result<()> {
    let user = app.active_user()?;

    match args.action {
        FreezeAction::Plan => {
            println!("{}", formatter.format_plan(&app.engine.plan_recovery(user)?)?);
        }
        FreezeAction::Apply => {
            let snapshot = app.engine.apply_freeze(user)?;
            if !formatter.is_json() {
                println!("{}", formatter.success("Streak recovered"));
            }
            println!("{}", formatter.format_snapshot(&snapshot)?);
        }
    }
    Ok(())
}
