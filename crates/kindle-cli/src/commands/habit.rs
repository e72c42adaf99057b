//! Habit command implementation.

use super::{parse_date, parse_habit};
use crate::app::App;
use crate::cli::{HabitAction, HabitArgs};
use crate::error::Result;
use crate::output::Formatter;
use kindle_domain::{HabitPatch, NewHabit, Visibility};

/// Execute the habit command.
pub fn execute_habit(args: HabitArgs, app: &App, formatter: &Formatter) -> Result<()> {
    let user = app.active_user()?;

    match args.action {
        HabitAction::Add {
            name,
            identity,
            kind,
            goal,
            days,
            target,
            private,
        } => {
            let input = NewHabit {
                name,
                identity,
                kind: kind.into(),
                goal,
                active_days: days,
                duration_target: target,
                visibility: if private {
                    Visibility::Private
                } else {
                    Visibility::Public
                },
            };
            let (habit, snapshot) = app.habits.create_habit(user, input)?;
            if formatter.is_json() {
                println!(
                    "{}",
                    formatter.json(&serde_json::json!({ "habit": habit, "streak": snapshot }))?
                );
            } else {
                println!(
                    "{}",
                    formatter.success(&format!("Created habit {} ({})", habit.name, habit.id))
                );
            }
        }
        HabitAction::List { date } => {
            let day = parse_date(date.as_deref())?;
            println!("{}", formatter.format_habits(&app.habits.list_habits(user, day)?)?);
        }
        HabitAction::Toggle { habit, date } => {
            let outcome =
                app.habits
                    .toggle_completion(user, parse_habit(&habit)?, parse_date(date.as_deref())?)?;
            if formatter.is_json() {
                println!("{}", formatter.json(&outcome)?);
            } else {
                let verb = if outcome.completed { "Completed" } else { "Uncompleted" };
                println!("{}", formatter.success(&format!("{} on {}", verb, outcome.date)));
                println!("{}", formatter.format_snapshot(&outcome.snapshot)?);
            }
        }
        HabitAction::Edit {
            habit,
            name,
            identity,
            goal,
            days,
            target,
            no_target,
            visibility,
        } => {
            let patch = HabitPatch {
                name,
                identity,
                goal,
                active_days: days,
                duration_target: if no_target { Some(None) } else { target.map(Some) },
                visibility: visibility.map(Into::into),
            };
            let (habit, snapshot) = app.habits.update_habit(user, parse_habit(&habit)?, patch)?;
            if formatter.is_json() {
                println!(
                    "{}",
                    formatter.json(&serde_json::json!({ "habit": habit, "streak": snapshot }))?
                );
            } else {
                println!("{}", formatter.success(&format!("Updated habit {}", habit.name)));
            }
        }
        HabitAction::Delete { habit } => {
            let snapshot = app.habits.delete_habit(user, parse_habit(&habit)?)?;
            if formatter.is_json() {
                println!("{}", formatter.json(&snapshot)?);
            } else {
                println!("{}", formatter.success("Habit deleted"));
                println!("{}", formatter.format_snapshot(&snapshot)?);
            }
        }
    }

    Ok(())
}
