//! Kindle CLI library.
//!
//! Configuration, argument parsing, command execution and output formatting
//! for the `kindle` binary. Commands run against a local SQLite database
//! through the streak engine.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use app::App;
pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
