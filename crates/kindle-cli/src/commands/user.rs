//! User command implementation.

use crate::app::App;
use crate::cli::{UserAction, UserArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kindle_domain::traits::UserStore;
use kindle_domain::User;
use std::path::Path;

/// Execute the user command.
pub fn execute_user(
    args: UserArgs,
    app: &App,
    config: &mut Config,
    config_path: &Path,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        UserAction::Add { name } => add_user(app, config, config_path, name, formatter),
        UserAction::List => {
            println!("{}", formatter.format_users(&app.store.list_users()?)?);
            Ok(())
        }
        UserAction::Use { user } => {
            let id = app.find_user(&user)?;
            config.active_user = Some(id.to_string());
            config.save_to(config_path)?;
            println!("{}", formatter.success(&format!("Now acting as {}", id)));
            Ok(())
        }
    }
}

/// Create a user; the first user becomes the active one.
fn add_user(
    app: &App,
    config: &mut Config,
    config_path: &Path,
    name: String,
    formatter: &Formatter,
) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::InvalidInput(
            "user name must not be empty".to_string(),
        ));
    }

    let user = User::new(name, app.engine.anchor().now());
    app.store.insert_user(&user)?;

    if config.active_user.is_none() {
        config.active_user = Some(user.id.to_string());
        config.save_to(config_path)?;
    }

    if formatter.is_json() {
        println!("{}", formatter.json(&user)?);
    } else {
        println!("{}", formatter.success(&format!("Created user {} ({})", user.name, user.id)));
    }
    Ok(())
}
