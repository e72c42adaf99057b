//! Admin command implementation.

use crate::app::App;
use crate::cli::{AdminAction, AdminArgs};
use crate::error::Result;
use crate::output::Formatter;

/// Execute the admin command.
pub fn execute_admin(args: AdminArgs, app: &App, formatter: &Formatter) -> Result<()> {
    let user = app.active_user()?;

    match args.action {
        AdminAction::SetFreezes { value } => {
            let snapshot = app.engine.admin_set_freezes(user, value)?;
            if !formatter.is_json() {
                println!(
                    "{}",
                    formatter.success(&format!("Freeze balance set to {}", snapshot.streak_freezes))
                );
            }
            println!("{}", formatter.format_snapshot(&snapshot)?);
        }
    }
    Ok(())
}
