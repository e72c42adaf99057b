//! Kindle CLI - habit tracking with a daily streak.

use clap::Parser;
use kindle_cli::commands;
use kindle_cli::{App, Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> kindle_cli::Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::path()?,
    };
    let mut config = Config::load_from(&config_path)?;

    init_tracing(&config.settings.log_level);

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let db = match cli.db {
        Some(path) => path,
        None => config.database()?,
    };
    let selector = cli.user.or_else(|| config.active_user.clone());
    let app = App::open(&db, config.engine.clone(), selector)?;

    match cli.command {
        Command::User(args) => {
            commands::execute_user(args, &app, &mut config, &config_path, &formatter)?
        }
        Command::Habit(args) => commands::execute_habit(args, &app, &formatter)?,
        Command::Streak(args) => commands::execute_streak(args, &app, &formatter)?,
        Command::Freeze(args) => commands::execute_freeze(args, &app, &formatter)?,
        Command::Admin(args) => commands::execute_admin(args, &app, &formatter)?,
        Command::Group(args) => commands::execute_group(args, &app, &formatter)?,
        Command::Stats => commands::execute_stats(&app, &formatter)?,
    }

    Ok(())
}

/// Log to stderr so JSON output on stdout stays parseable.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
