//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Kindle CLI - Track habits and keep your streak alight.
#[derive(Debug, Parser)]
#[command(name = "kindle")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file path
    #[arg(long, global = true, env = "KINDLE_DB")]
    pub db: Option<PathBuf>,

    /// User to act as (id or name)
    #[arg(short, long, global = true, env = "KINDLE_USER")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage users
    User(UserArgs),

    /// Manage habits and their completions
    Habit(HabitArgs),

    /// Inspect and recompute the streak
    Streak(StreakArgs),

    /// Plan or spend streak freezes
    Freeze(FreezeArgs),

    /// Administrative adjustments
    Admin(AdminArgs),

    /// Manage groups and the group streak
    Group(GroupArgs),

    /// Sync every user and print engine metrics
    Stats,
}

/// Arguments for user management.
#[derive(Debug, Parser)]
pub struct UserArgs {
    #[command(subcommand)]
    pub action: UserAction,
}

/// User management actions.
#[derive(Debug, Subcommand)]
pub enum UserAction {
    /// Create a user
    Add {
        /// Display name
        name: String,
    },

    /// List all users
    List,

    /// Make a user the default for later commands
    Use {
        /// User id or name
        user: String,
    },
}

/// Arguments for habit management.
#[derive(Debug, Parser)]
pub struct HabitArgs {
    #[command(subcommand)]
    pub action: HabitAction,
}

/// Habit management actions.
#[derive(Debug, Subcommand)]
pub enum HabitAction {
    /// Create a habit
    Add {
        /// Habit name
        name: String,

        /// Identity the habit builds (e.g. "reader")
        #[arg(short, long, default_value = "")]
        identity: String,

        /// Build a new habit or break an old one
        #[arg(short, long, value_enum, default_value = "build")]
        kind: KindArg,

        /// Numeric goal
        #[arg(short, long, default_value = "1")]
        goal: u32,

        /// Active weekdays, 1=Mon..7=Sun (default: every day)
        #[arg(short, long, value_delimiter = ',')]
        days: Vec<u8>,

        /// Completions after which the habit is finished
        #[arg(short, long)]
        target: Option<u32>,

        /// Hide the habit from friends
        #[arg(long)]
        private: bool,
    },

    /// List habits for a day
    List {
        /// Day to annotate, YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Toggle a completion
    Toggle {
        /// Habit id
        habit: String,

        /// Day to toggle, YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Edit a habit
    Edit {
        /// Habit id
        habit: String,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New identity
        #[arg(short, long)]
        identity: Option<String>,

        /// New goal
        #[arg(short, long)]
        goal: Option<u32>,

        /// New active weekdays, 1=Mon..7=Sun
        #[arg(short, long, value_delimiter = ',')]
        days: Option<Vec<u8>>,

        /// New duration target
        #[arg(short, long, conflicts_with = "no_target")]
        target: Option<u32>,

        /// Remove the duration target
        #[arg(long)]
        no_target: bool,

        /// New visibility
        #[arg(short, long, value_enum)]
        visibility: Option<VisibilityArg>,
    },

    /// Delete a habit
    Delete {
        /// Habit id
        habit: String,
    },
}

/// Arguments for streak inspection.
#[derive(Debug, Parser)]
pub struct StreakArgs {
    #[command(subcommand)]
    pub action: StreakAction,
}

/// Streak actions.
#[derive(Debug, Subcommand)]
pub enum StreakAction {
    /// Show the stored streak
    Show,

    /// Recompute today and persist the result
    Sync,

    /// Recount the stored ledger without writing
    Recount,
}

/// Arguments for freeze handling.
#[derive(Debug, Parser)]
pub struct FreezeArgs {
    #[command(subcommand)]
    pub action: FreezeAction,
}

/// Freeze actions.
#[derive(Debug, Subcommand)]
pub enum FreezeAction {
    /// Show which days a freeze would recover
    Plan,

    /// Spend freezes to recover the gap
    Apply,
}

/// Arguments for admin adjustments.
#[derive(Debug, Parser)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub action: AdminAction,
}

/// Admin actions.
#[derive(Debug, Subcommand)]
pub enum AdminAction {
    /// Overwrite the freeze balance
    SetFreezes {
        /// New balance
        #[arg(allow_hyphen_values = true)]
        value: i64,
    },
}

/// Arguments for group management.
#[derive(Debug, Parser)]
pub struct GroupArgs {
    #[command(subcommand)]
    pub action: GroupAction,
}

/// Group actions.
#[derive(Debug, Subcommand)]
pub enum GroupAction {
    /// Create a group owned by the active user
    Create {
        /// Group name
        name: String,
    },

    /// Join a group as the active user
    Join {
        /// Group id
        group: String,
    },

    /// Link one of the active user's habits to a group
    Link {
        /// Group id
        group: String,

        /// Habit id
        habit: String,
    },

    /// Re-evaluate the group streak for today
    Refresh {
        /// Group id
        group: String,
    },

    /// Show a group
    Show {
        /// Group id
        group: String,
    },

    /// List all groups
    List,
}

/// Habit kind argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum KindArg {
    /// Build a new habit
    Build,
    /// Break an old habit
    Break,
}

/// Visibility argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum VisibilityArg {
    /// Visible to friends
    Public,
    /// Visible only to the owner
    Private,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

impl From<KindArg> for kindle_domain::HabitKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Build => kindle_domain::HabitKind::Build,
            KindArg::Break => kindle_domain::HabitKind::Break,
        }
    }
}

impl From<VisibilityArg> for kindle_domain::Visibility {
    fn from(visibility: VisibilityArg) -> Self {
        match visibility {
            VisibilityArg::Public => kindle_domain::Visibility::Public,
            VisibilityArg::Private => kindle_domain::Visibility::Private,
        }
    }
}
