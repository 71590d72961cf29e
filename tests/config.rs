mod support;

use std::fs;
use std::path::PathBuf;

use predicates::str::contains;
use todo_store::config::{Config, Overrides};
use todo_store::error::{exit_codes, Error};

#[test]
fn config_defaults_when_missing() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default(None)?;

    assert_eq!(config.storage_path, PathBuf::from("todos.json"));
    assert_eq!(config.max_tasks, 1000);
    assert_eq!(config.max_title_length, 200);
    assert_eq!(config.max_description_length, 1000);
    assert_eq!(config.log_level, "warn");
    Ok(())
}

#[test]
fn config_overrides_from_toml() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config_path = dir.path().join("todo.toml");
    let toml = r#"
storage_path = "/var/lib/todo/tasks.json"
max_tasks = 50
max_title_length = 80
log_level = "todo_store=debug"
"#;
    fs::write(&config_path, toml)?;

    let config = Config::load(&config_path)?;
    assert_eq!(config.storage_path, PathBuf::from("/var/lib/todo/tasks.json"));
    assert_eq!(config.max_tasks, 50);
    assert_eq!(config.max_title_length, 80);
    assert_eq!(config.max_description_length, 1000);
    assert_eq!(config.log_level, "todo_store=debug");
    Ok(())
}

#[test]
fn overrides_win_over_file_values() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config_path = dir.path().join("todo.toml");
    fs::write(&config_path, "max_tasks = 50\n")?;

    let config = Config::load(&config_path)?.with_overrides(Overrides {
        max_tasks: Some(3),
        storage_path: Some(dir.path().join("other.json")),
        ..Overrides::default()
    })?;
    assert_eq!(config.max_tasks, 3);
    assert_eq!(config.storage_path, dir.path().join("other.json"));
    Ok(())
}

#[test]
fn invalid_values_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config_path = dir.path().join("todo.toml");

    fs::write(&config_path, "max_tasks = 0\n")?;
    assert!(matches!(Config::load(&config_path), Err(Error::InvalidConfig(_))));

    fs::write(&config_path, "max_tasks = \"many\"\n")?;
    assert!(matches!(Config::load(&config_path), Err(Error::TomlParse(_))));

    let missing = dir.path().join("absent.toml");
    let err = Config::load_or_default(Some(&missing)).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);

    let err = Config::default()
        .with_overrides(Overrides {
            max_title_length: Some(0),
            ..Overrides::default()
        })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
    Ok(())
}

#[test]
fn config_round_trips_through_save() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config_path = dir.path().join("todo.toml");
    let config = Config {
        max_tasks: 7,
        log_level: "info".to_string(),
        ..Config::default()
    };

    config.save(&config_path)?;
    assert_eq!(Config::load(&config_path)?, config);
    Ok(())
}

#[test]
fn cli_reads_config_file_and_rejects_bad_environment() -> Result<(), Box<dyn std::error::Error>> {
    let dir = support::TestDir::new()?;
    let config_path = dir.path().join("todo.toml");
    fs::write(&config_path, "max_title_length = 3\n")?;

    dir.cmd()
        .env("TODO_CONFIG", &config_path)
        .args(["add", "toolong"])
        .assert()
        .code(exit_codes::USER_ERROR)
        .stderr(contains("Invalid title"));

    dir.cmd()
        .env("MAX_TODOS", "0")
        .args(["list"])
        .assert()
        .code(exit_codes::USER_ERROR)
        .stderr(contains("Invalid configuration"));
    Ok(())
}
