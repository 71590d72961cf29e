//! Named tool dispatch
//!
//! A transport hands over a tool name and a JSON argument object; this module
//! maps it onto a [`TaskStore`] operation and returns the structured result.
//! Field names in arguments and results match the persisted task layout.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::query::TaskFilter;
use crate::store::{TaskStore, Transition};
use crate::task::{NewTask, Priority, TaskChanges};

/// Every tool name `dispatch` accepts
pub const TOOL_NAMES: [&str; 10] = [
    "add_todo",
    "list_todos",
    "get_todo",
    "update_todo",
    "complete_todo",
    "reopen_todo",
    "delete_todo",
    "clear_completed_todos",
    "get_todo_stats",
    "health_check",
];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AddArgs {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    priority: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListArgs {
    #[serde(default = "all")]
    status: String,
    #[serde(default = "all")]
    priority: String,
}

fn all() -> String {
    "all".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IdArgs {
    todo_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateArgs {
    todo_id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

/// Invoke the tool `name` with `args` against `store`.
///
/// `args` may be `null` for tools without arguments.
pub fn dispatch(store: &TaskStore, name: &str, args: Value) -> Result<Value> {
    debug!(tool = name, "dispatching tool call");
    match name {
        "add_todo" => {
            let args: AddArgs = parse_args(name, args)?;
            let priority = parse_priority(args.priority.as_deref())?.unwrap_or_default();
            let task = store.create(
                NewTask::new(args.title)
                    .description(args.description)
                    .priority(priority),
            )?;
            Ok(serde_json::to_value(task)?)
        }
        "list_todos" => {
            let args: ListArgs = parse_args(name, args)?;
            let filter = TaskFilter::parse(&args.status, &args.priority)?;
            let tasks = store.list(&filter)?;
            Ok(json!({ "total": tasks.len(), "tasks": tasks }))
        }
        "get_todo" => {
            let args: IdArgs = parse_args(name, args)?;
            Ok(serde_json::to_value(store.get(args.todo_id)?)?)
        }
        "update_todo" => {
            let args: UpdateArgs = parse_args(name, args)?;
            let changes = TaskChanges {
                title: args.title,
                description: args.description,
                priority: parse_priority(args.priority.as_deref())?,
            };
            Ok(serde_json::to_value(store.update(args.todo_id, changes)?)?)
        }
        "complete_todo" => {
            let args: IdArgs = parse_args(name, args)?;
            transition_value(store.complete(args.todo_id)?)
        }
        "reopen_todo" => {
            let args: IdArgs = parse_args(name, args)?;
            transition_value(store.reopen(args.todo_id)?)
        }
        "delete_todo" => {
            let args: IdArgs = parse_args(name, args)?;
            let task = store.delete(args.todo_id)?;
            Ok(json!({ "deleted": task.id }))
        }
        "clear_completed_todos" => {
            let _: NoArgs = parse_args(name, args)?;
            Ok(json!({ "cleared": store.clear_completed()? }))
        }
        "get_todo_stats" => {
            let _: NoArgs = parse_args(name, args)?;
            Ok(serde_json::to_value(store.stats()?)?)
        }
        "health_check" => {
            let _: NoArgs = parse_args(name, args)?;
            Ok(serde_json::to_value(store.health_check())?)
        }
        other => Err(Error::UnknownTool(other.to_string())),
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|err| Error::InvalidArgument(format!("{tool}: {err}")))
}

fn parse_priority(value: Option<&str>) -> Result<Option<Priority>> {
    value.map(str::parse::<Priority>).transpose()
}

fn transition_value(transition: Transition) -> Result<Value> {
    let changed = transition.changed();
    let message = match &transition {
        Transition::Changed(_) => None,
        Transition::AlreadyCompleted(task) => Some(format!("Task {} is already completed", task.id)),
        Transition::AlreadyPending(task) => Some(format!("Task {} is already pending", task.id)),
    };
    let mut value = json!({ "changed": changed, "task": transition.into_task() });
    if let Some(message) = message {
        value["message"] = Value::String(message);
    }
    Ok(value)
}
