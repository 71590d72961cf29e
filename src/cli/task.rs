//! todo command implementations.

use serde::Serialize;
use serde_json::Value;

use crate::error::{exit_codes, Error, Result};
use crate::output::{
    emit_success, stats_human, task_human, task_line, HumanOutput, OutputOptions,
};
use crate::query::TaskFilter;
use crate::store::{TaskStore, Transition};
use crate::task::{NewTask, Priority, Task, TaskChanges};
use crate::tools;

pub struct AddOptions {
    pub title: String,
    pub description: String,
    pub priority: String,
}

pub struct ListOptions {
    pub status: String,
    pub priority: String,
}

pub struct UpdateOptions {
    pub id: u64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
}

#[derive(Serialize)]
struct TaskListOutput {
    total: usize,
    status: String,
    priority: String,
    tasks: Vec<Task>,
}

#[derive(Serialize)]
struct TransitionOutput {
    changed: bool,
    task: Task,
}

#[derive(Serialize)]
struct DeleteOutput {
    deleted: u64,
}

#[derive(Serialize)]
struct ClearOutput {
    cleared: usize,
}

pub fn run_add(store: &TaskStore, options: AddOptions, output: OutputOptions) -> Result<()> {
    let priority: Priority = options.priority.parse()?;
    let task = store.create(
        NewTask::new(options.title)
            .description(options.description)
            .priority(priority),
    )?;

    let human = task_human("Task created", &task);
    emit_success(output, "add", &task, Some(&human))
}

pub fn run_list(store: &TaskStore, options: ListOptions, output: OutputOptions) -> Result<()> {
    let filter = TaskFilter::parse(&options.status, &options.priority)?;
    let tasks = store.list(&filter)?;

    let mut human = HumanOutput::new("Tasks");
    human.push_summary("Total", tasks.len().to_string());
    human.push_summary("Status", filter.status.to_string());
    human.push_summary("Priority", filter.priority.to_string());
    if tasks.is_empty() {
        human.push_detail("No tasks found matching the criteria.");
    }
    for task in &tasks {
        human.push_detail(task_line(task));
    }

    let data = TaskListOutput {
        total: tasks.len(),
        status: filter.status.to_string(),
        priority: filter.priority.to_string(),
        tasks,
    };
    emit_success(output, "list", &data, Some(&human))
}

pub fn run_show(store: &TaskStore, id: u64, output: OutputOptions) -> Result<()> {
    let task = store.get(id)?;
    let human = task_human(format!("Task #{id}"), &task);
    emit_success(output, "show", &task, Some(&human))
}

pub fn run_update(store: &TaskStore, options: UpdateOptions, output: OutputOptions) -> Result<()> {
    let priority = options
        .priority
        .as_deref()
        .map(str::parse::<Priority>)
        .transpose()?;
    let changes = TaskChanges {
        title: options.title,
        description: options.description,
        priority,
    };
    let task = store.update(options.id, changes)?;

    let human = task_human("Task updated", &task);
    emit_success(output, "update", &task, Some(&human))
}

pub fn run_complete(store: &TaskStore, id: u64, output: OutputOptions) -> Result<()> {
    let transition = store.complete(id)?;
    emit_transition(output, "complete", "Task completed", transition)
}

pub fn run_reopen(store: &TaskStore, id: u64, output: OutputOptions) -> Result<()> {
    let transition = store.reopen(id)?;
    emit_transition(output, "reopen", "Task reopened", transition)
}

fn emit_transition(
    output: OutputOptions,
    command: &str,
    header: &str,
    transition: Transition,
) -> Result<()> {
    let changed = transition.changed();
    let header = match &transition {
        Transition::Changed(_) => header.to_string(),
        Transition::AlreadyCompleted(task) => format!("Task {} is already completed", task.id),
        Transition::AlreadyPending(task) => format!("Task {} is already pending", task.id),
    };
    let task = transition.into_task();

    let mut human = task_human(header.clone(), &task);
    if !changed {
        human.push_warning(format!("{header}; nothing changed"));
    }
    emit_success(output, command, &TransitionOutput { changed, task }, Some(&human))
}

pub fn run_delete(store: &TaskStore, id: u64, output: OutputOptions) -> Result<()> {
    let task = store.delete(id)?;

    let mut human = HumanOutput::new("Task deleted");
    human.push_summary("ID", task.id.to_string());
    human.push_summary("Title", task.title);
    emit_success(output, "delete", &DeleteOutput { deleted: id }, Some(&human))
}

pub fn run_clear_completed(store: &TaskStore, output: OutputOptions) -> Result<()> {
    let cleared = store.clear_completed()?;

    let header = if cleared == 0 {
        "No completed tasks to clear".to_string()
    } else {
        format!("Cleared {cleared} completed task(s)")
    };
    let human = HumanOutput::new(header);
    emit_success(output, "clear-completed", &ClearOutput { cleared }, Some(&human))
}

pub fn run_stats(store: &TaskStore, output: OutputOptions) -> Result<()> {
    let stats = store.stats()?;
    let human = stats_human(&stats);
    emit_success(output, "stats", &stats, Some(&human))
}

/// Print the health report; a failed check maps to a non-zero exit code.
pub fn run_health(store: &TaskStore, output: OutputOptions) -> Result<i32> {
    let report = store.health_check();
    let details = &report.details;

    let mut human = HumanOutput::new(if report.ok {
        "Store healthy"
    } else {
        "Store unhealthy"
    });
    human.push_summary("Storage", details.storage_path.display().to_string());
    human.push_summary("Tasks", format!("{}/{}", details.task_count, details.max_tasks));
    human.push_summary("Last id", details.last_id.to_string());
    human.push_summary("Readable", details.readable.to_string());
    human.push_summary("Writable", details.writable.to_string());
    human.push_summary("In sync", details.in_sync.to_string());
    for issue in &details.issues {
        human.push_warning(issue.clone());
    }

    emit_success(output, "health", &report, Some(&human))?;
    Ok(if report.ok {
        exit_codes::SUCCESS
    } else {
        exit_codes::OPERATION_FAILED
    })
}

pub fn run_call(
    store: &TaskStore,
    tool: &str,
    args: Option<&str>,
    output: OutputOptions,
) -> Result<()> {
    let args = match args {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|err| Error::InvalidArgument(format!("tool arguments: {err}")))?,
        None => Value::Null,
    };
    let result = tools::dispatch(store, tool, args)?;

    let mut human = HumanOutput::new(format!("Tool {tool}"));
    human.push_detail(serde_json::to_string_pretty(&result)?);
    emit_success(output, "call", &result, Some(&human))
}

pub fn run_tools(output: OutputOptions) -> Result<()> {
    let mut human = HumanOutput::new("Tools");
    for name in tools::TOOL_NAMES {
        human.push_detail(name);
    }
    emit_success(output, "tools", &tools::TOOL_NAMES, Some(&human))
}
