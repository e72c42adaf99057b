//! Command flows against a temporary database.

use kindle_cli::cli::{HabitAction, HabitArgs, KindArg, StreakAction, StreakArgs, UserAction, UserArgs};
use kindle_cli::commands::{execute_habit, execute_streak, execute_user};
use kindle_cli::config::OutputFormat;
use kindle_cli::{App, CliError, Config, Formatter};
use kindle_domain::traits::{HabitStore, UserStore};
use kindle_engine::EngineConfig;

fn formatter() -> Formatter {
    Formatter::new(OutputFormat::Json, false)
}

#[test]
fn test_first_user_becomes_active() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    let app = App::open(&dir.path().join("kindle.db"), EngineConfig::default(), None).unwrap();
    let mut config = Config::default();

    let add = |name: &str| UserArgs {
        action: UserAction::Add {
            name: name.to_string(),
        },
    };
    execute_user(add("Asha"), &app, &mut config, &config_path, &formatter()).unwrap();
    execute_user(add("Ravi"), &app, &mut config, &config_path, &formatter()).unwrap();

    let users = app.store.list_users().unwrap();
    assert_eq!(users.len(), 2);
    let asha = users.iter().find(|u| u.name == "Asha").unwrap();

    let saved = Config::load_from(&config_path).unwrap();
    assert_eq!(saved.active_user, Some(asha.id.to_string()));
}

#[test]
fn test_blank_user_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = App::open(&dir.path().join("kindle.db"), EngineConfig::default(), None).unwrap();
    let mut config = Config::default();

    let result = execute_user(
        UserArgs {
            action: UserAction::Add {
                name: "  ".to_string(),
            },
        },
        &app,
        &mut config,
        &dir.path().join("config.toml"),
        &formatter(),
    );
    assert!(matches!(result, Err(CliError::InvalidInput(_))));
}

#[test]
fn test_habit_commands_require_a_user() {
    let dir = tempfile::tempdir().unwrap();
    let app = App::open(&dir.path().join("kindle.db"), EngineConfig::default(), None).unwrap();

    let result = execute_streak(
        StreakArgs {
            action: StreakAction::Show,
        },
        &app,
        &formatter(),
    );
    assert!(matches!(result, Err(CliError::NoActiveUser)));
}

#[test]
fn test_add_and_toggle_habit() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("kindle.db");
    let mut config = Config::default();
    {
        let app = App::open(&db, EngineConfig::default(), None).unwrap();
        execute_user(
            UserArgs {
                action: UserAction::Add {
                    name: "Asha".to_string(),
                },
            },
            &app,
            &mut config,
            &dir.path().join("config.toml"),
            &formatter(),
        )
        .unwrap();
    }

    let app = App::open(&db, EngineConfig::default(), Some("asha".to_string())).unwrap();
    let user = app.active_user().unwrap();

    execute_habit(
        HabitArgs {
            action: HabitAction::Add {
                name: "Read".to_string(),
                identity: "reader".to_string(),
                kind: KindArg::Build,
                goal: 1,
                days: Vec::new(),
                target: None,
                private: false,
            },
        },
        &app,
        &formatter(),
    )
    .unwrap();

    let habits = app.store.habits_for_user(user).unwrap();
    assert_eq!(habits.len(), 1);

    execute_habit(
        HabitArgs {
            action: HabitAction::Toggle {
                habit: habits[0].id.to_string(),
                date: None,
            },
        },
        &app,
        &formatter(),
    )
    .unwrap();

    let snapshot = app.engine.snapshot(user).unwrap();
    assert_eq!(snapshot.streak, 1);
    assert_eq!(snapshot.history.len(), 1);
}
