mod support;

use predicates::str::contains;
use serde_json::Value;
use todo_store::error::exit_codes;

use support::TestDir;

fn add(dir: &TestDir, args: &[&str]) -> Result<Value, Box<dyn std::error::Error>> {
    let mut full = vec!["add"];
    full.extend_from_slice(args);
    let envelope = dir.json(&full)?;
    assert_eq!(envelope["status"], "success", "{envelope}");
    Ok(envelope["data"].clone())
}

#[test]
fn add_returns_the_task_in_a_json_envelope() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;

    let envelope = dir.json(&["add", "Buy milk", "-p", "high", "-d", "2 litres"])?;
    assert_eq!(envelope["schema_version"], "todo.v1");
    assert_eq!(envelope["command"], "add");
    assert_eq!(envelope["data"]["id"], 1);
    assert_eq!(envelope["data"]["title"], "Buy milk");
    assert_eq!(envelope["data"]["priority"], "high");
    assert_eq!(envelope["data"]["description"], "2 litres");
    assert_eq!(envelope["data"]["status"], "pending");

    assert_eq!(dir.read_primary()?["last_id"], 1);
    Ok(())
}

#[test]
fn list_filters_by_status_and_priority() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;
    add(&dir, &["a", "-p", "high"])?;
    add(&dir, &["b", "-p", "low"])?;
    add(&dir, &["c", "-p", "high"])?;
    dir.cmd().args(["complete", "3"]).assert().success();

    let listed = dir.json(&["list", "--status", "pending", "--priority", "high"])?;
    assert_eq!(listed["data"]["total"], 1);
    assert_eq!(listed["data"]["tasks"][0]["id"], 1);

    let all = dir.json(&["list"])?;
    let ids: Vec<u64> = all["data"]["tasks"]
        .as_array()
        .expect("tasks")
        .iter()
        .filter_map(|task| task["id"].as_u64())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);

    dir.cmd()
        .args(["list"])
        .assert()
        .success()
        .stdout(contains("[completed][high] #3 c"));
    Ok(())
}

#[test]
fn update_complete_reopen_and_delete() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;
    add(&dir, &["draft", "-d", "keep me"])?;

    let updated = dir.json(&["update", "1", "--title", "final"])?;
    assert_eq!(updated["data"]["title"], "final");
    assert_eq!(updated["data"]["description"], "keep me");

    let completed = dir.json(&["complete", "1"])?;
    assert_eq!(completed["data"]["changed"], true);
    assert_eq!(completed["data"]["task"]["status"], "completed");

    let again = dir.json(&["complete", "1"])?;
    assert_eq!(again["status"], "success");
    assert_eq!(again["data"]["changed"], false);
    assert!(again["warnings"][0]
        .as_str()
        .is_some_and(|warning| warning.contains("already completed")));

    let reopened = dir.json(&["reopen", "1"])?;
    assert_eq!(reopened["data"]["task"]["status"], "pending");
    assert!(reopened["data"]["task"]["completed_at"].is_null());

    let deleted = dir.json(&["delete", "1"])?;
    assert_eq!(deleted["data"]["deleted"], 1);

    dir.cmd()
        .args(["show", "1"])
        .assert()
        .code(exit_codes::USER_ERROR)
        .stderr(contains("get: task 1 not found"));
    Ok(())
}

#[test]
fn errors_use_the_json_error_envelope() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;

    let output = dir
        .cmd()
        .args(["--json", "complete", "42"])
        .assert()
        .code(exit_codes::USER_ERROR)
        .get_output()
        .stdout
        .clone();
    let envelope: Value = serde_json::from_slice(&output)?;
    assert_eq!(envelope["status"], "error");
    assert_eq!(envelope["command"], "complete");
    assert_eq!(envelope["error"]["kind"], "not_found");
    assert_eq!(envelope["error"]["details"]["id"], 42);
    assert_eq!(envelope["error"]["code"], exit_codes::USER_ERROR);

    let envelope = dir.json(&["add", "x", "-p", "urgent"])?;
    assert_eq!(envelope["error"]["kind"], "validation");
    assert_eq!(envelope["error"]["details"]["field"], "priority");

    let envelope = dir.json(&["add", "   "])?;
    assert_eq!(envelope["error"]["details"]["field"], "title");
    assert!(!dir.storage_path().exists());
    Ok(())
}

#[test]
fn clear_completed_and_stats() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;
    for title in ["a", "b", "c", "d", "e"] {
        add(&dir, &[title])?;
    }
    for id in ["1", "2"] {
        dir.cmd().args(["complete", id]).assert().success();
    }

    let stats = dir.json(&["stats"])?;
    assert_eq!(stats["data"]["total"], 5);
    assert_eq!(stats["data"]["completed"], 2);
    assert_eq!(stats["data"]["completion_rate"], 0.4);
    assert_eq!(stats["data"]["by_priority"]["medium"]["pending"], 3);

    dir.cmd()
        .arg("stats")
        .assert()
        .success()
        .stdout(contains("Completion rate: 40.0%"));

    let cleared = dir.json(&["clear-completed"])?;
    assert_eq!(cleared["data"]["cleared"], 2);
    let cleared = dir.json(&["clear-completed"])?;
    assert_eq!(cleared["data"]["cleared"], 0);
    Ok(())
}

#[test]
fn capacity_from_environment() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;
    dir.cmd().env("MAX_TODOS", "1").args(["add", "a"]).assert().success();
    dir.cmd()
        .env("MAX_TODOS", "1")
        .args(["add", "b"])
        .assert()
        .code(exit_codes::USER_ERROR)
        .stderr(contains("Maximum number of tasks (1) reached"));
    Ok(())
}

#[test]
fn health_reports_ok_and_corruption() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;
    let health = dir.json(&["health"])?;
    assert_eq!(health["data"]["ok"], true);

    std::fs::write(dir.storage_path(), "garbage")?;
    dir.cmd()
        .arg("health")
        .assert()
        .code(exit_codes::STORE_UNAVAILABLE)
        .stderr(contains("Storage corrupt"));
    Ok(())
}

#[test]
fn call_dispatches_named_tools() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;

    let added = dir.json(&["call", "add_todo", r#"{"title": "via tool", "priority": "low"}"#])?;
    assert_eq!(added["data"]["id"], 1);
    assert_eq!(added["data"]["priority"], "low");

    let fetched = dir.json(&["call", "get_todo", r#"{"todo_id": 1}"#])?;
    assert_eq!(fetched["data"]["title"], "via tool");

    let stats = dir.json(&["call", "get_todo_stats"])?;
    assert_eq!(stats["data"]["total"], 1);

    let unknown = dir.json(&["call", "drop_everything", "{}"])?;
    assert_eq!(unknown["error"]["kind"], "unknown_tool");

    let malformed = dir.json(&["call", "get_todo", "{not json"])?;
    assert_eq!(malformed["error"]["kind"], "invalid_argument");
    Ok(())
}
