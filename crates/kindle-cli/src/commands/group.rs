//! Group command implementation.

use super::{parse_group, parse_habit};
use crate::app::App;
use crate::cli::{GroupAction, GroupArgs};
use crate::error::Result;
use crate::output::Formatter;

/// Execute the group command.
pub fn execute_group(args: GroupArgs, app: &App, formatter: &Formatter) -> Result<()> {
    let group = match args.action {
        GroupAction::Create { name } => app.groups.create_group(app.active_user()?, &name)?,
        GroupAction::Join { group } => app
            .groups
            .join_group(parse_group(&group)?, app.active_user()?)?,
        GroupAction::Link { group, habit } => app.groups.link_habit(
            parse_group(&group)?,
            app.active_user()?,
            parse_habit(&habit)?,
        )?,
        GroupAction::Refresh { group } => app.groups.refresh_group_streak(parse_group(&group)?)?,
        GroupAction::Show { group } => app.groups.get_group(parse_group(&group)?)?,
        GroupAction::List => {
            println!("{}", formatter.format_groups(&app.groups.list_groups()?)?);
            return Ok(());
        }
    };

    println!("{}", formatter.format_group(&group)?);
    Ok(())
}
