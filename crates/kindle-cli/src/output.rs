//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use kindle_domain::{Group, RecoveryPlan, StreakClass, StreakSnapshot, User};
use kindle_engine::{HabitView, Recount};
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Whether output is JSON.
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Serialize any value as pretty JSON.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }

    /// Format users output.
    pub fn format_users(&self, users: &[User]) -> Result<String> {
        if self.is_json() {
            return self.json(users);
        }
        if users.is_empty() {
            return Ok(self.colorize("No users found.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Name", "Created"]);
        for user in users {
            builder.push_record([
                user.id.to_string(),
                user.name.clone(),
                user.created_at.format("%Y-%m-%d").to_string(),
            ]);
        }
        Ok(self.table(builder))
    }

    /// Format habits annotated for one day.
    pub fn format_habits(&self, views: &[HabitView]) -> Result<String> {
        if self.is_json() {
            return self.json(views);
        }
        if views.is_empty() {
            return Ok(self.colorize("No habits found.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Name", "Type", "Days", "Progress", "Today"]);
        for view in views {
            let habit = &view.habit;
            let days: Vec<String> = habit.active_days.iter().map(|d| d.to_string()).collect();
            let progress = match habit.duration_target {
                Some(target) => format!("{}/{}", habit.completions.len(), target),
                None => habit.completions.len().to_string(),
            };
            let today = if view.finished {
                "finished"
            } else if !view.active {
                "rest"
            } else if view.completed {
                "done"
            } else {
                "open"
            };
            builder.push_record([
                habit.id.to_string(),
                habit.name.clone(),
                habit.kind.as_str().to_string(),
                days.join(","),
                progress,
                today.to_string(),
            ]);
        }
        Ok(self.table(builder))
    }

    /// Format a streak snapshot.
    pub fn format_snapshot(&self, snapshot: &StreakSnapshot) -> Result<String> {
        if self.is_json() {
            return self.json(snapshot);
        }

        let state = match snapshot.streak_state {
            StreakClass::Active => self.colorize("active", "green"),
            StreakClass::Frozen => self.colorize("frozen", "cyan"),
            StreakClass::Extinguished => self.colorize("extinguished", "red"),
        };
        let last = snapshot
            .last_completed_date_ist
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());

        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        builder.push_record(["Streak".to_string(), snapshot.streak.to_string()]);
        builder.push_record(["State".to_string(), state]);
        builder.push_record([
            "Today".to_string(),
            format!(
                "{}% ({}/{})",
                snapshot.completion_percentage, snapshot.completed_habits, snapshot.total_habits
            ),
        ]);
        builder.push_record(["Freezes".to_string(), snapshot.streak_freezes.to_string()]);
        builder.push_record(["Full days".to_string(), snapshot.history.len().to_string()]);
        builder.push_record(["Ember days".to_string(), snapshot.ember_days.len().to_string()]);
        builder.push_record(["Frozen days".to_string(), snapshot.frozen_days.len().to_string()]);
        builder.push_record(["Last completed".to_string(), last]);

        let mut out = self.table(builder);
        if snapshot.streak_updated {
            out.push('\n');
            out.push_str(&self.info("Streak updated"));
        }
        Ok(out)
    }

    /// Format a recovery plan.
    pub fn format_plan(&self, plan: &RecoveryPlan) -> Result<String> {
        if self.is_json() {
            return self.json(plan);
        }
        if !plan.recoverable {
            return Ok(self.info("Nothing to recover."));
        }
        let days: Vec<String> = plan.missing_dates.iter().map(|d| d.to_string()).collect();
        Ok(format!(
            "{}\n  {}",
            self.warning(&format!("{} freeze(s) needed to recover:", plan.days_needed)),
            days.join(", ")
        ))
    }

    /// Format a recount report.
    pub fn format_recount(&self, recount: &Recount) -> Result<String> {
        if self.is_json() {
            return self.json(recount);
        }
        if recount.is_consistent() {
            Ok(self.success(&format!("Stored streak {} is consistent", recount.stored)))
        } else {
            Ok(self.warning(&format!(
                "Stored streak {} differs from recount {}",
                recount.stored, recount.recomputed
            )))
        }
    }

    /// Format groups output.
    pub fn format_groups(&self, groups: &[Group]) -> Result<String> {
        if self.is_json() {
            return self.json(groups);
        }
        if groups.is_empty() {
            return Ok(self.colorize("No groups found.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Name", "Members", "Linked", "Streak", "Last completed"]);
        for group in groups {
            builder.push_record([
                group.id.to_string(),
                group.name.clone(),
                group.members.len().to_string(),
                group.linked_habits().len().to_string(),
                group.streak.group_streak.to_string(),
                group
                    .streak
                    .last_completed_date_ist
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]);
        }
        Ok(self.table(builder))
    }

    /// Format a single group.
    pub fn format_group(&self, group: &Group) -> Result<String> {
        if self.is_json() {
            return self.json(group);
        }
        let mut out = self.format_groups(std::slice::from_ref(group))?;
        for member in &group.members {
            let habit = member
                .habit_id
                .map(|h| h.to_string())
                .unwrap_or_else(|| "(no habit linked)".to_string());
            out.push_str(&format!("\n  {} -> {}", member.user_id, habit));
        }
        Ok(out)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}
