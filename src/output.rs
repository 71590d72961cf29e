//! Shared output formatting for todo CLI commands.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::query::Stats;
use crate::task::{Status, Task};

pub const SCHEMA_VERSION: &str = "todo.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let warnings = human.map(|h| h.warnings.clone()).unwrap_or_default();

        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            warnings: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }

    if let Some(human) = human {
        println!("{}", format_human(human));
    }

    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let hint = error_hint(err);
    if json {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            message: &'a str,
            code: i32,
            kind: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<serde_json::Value>,
            #[serde(skip_serializing_if = "Option::is_none")]
            hint: Option<&'a str>,
        }

        #[derive(Serialize)]
        struct Envelope<'a> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            error: ErrorBody<'a>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: ErrorBody {
                message: &err.to_string(),
                code: err.exit_code(),
                kind: err.kind(),
                details: err.details(),
                hint: hint.as_deref(),
            },
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = hint {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = Vec::new();
    lines.push(output.header.clone());

    push_summary(&mut lines, &output.summary);
    push_section(&mut lines, "Details", &output.details);
    push_section(&mut lines, "Warnings", &output.warnings);

    lines.join("\n")
}

/// One-line rendering used by `list`: `[pending][high] #3 Title`
pub fn task_line(task: &Task) -> String {
    format!(
        "[{}][{}] #{} {}",
        task.status, task.priority, task.id, task.title
    )
}

/// Full rendering of a single task as a summary block
pub fn task_human(header: impl Into<String>, task: &Task) -> HumanOutput {
    let mut human = HumanOutput::new(header);
    human.push_summary("ID", task.id.to_string());
    human.push_summary("Title", task.title.clone());
    if !task.description.is_empty() {
        human.push_summary("Description", task.description.clone());
    }
    human.push_summary("Status", task.status.to_string());
    human.push_summary("Priority", task.priority.to_string());
    human.push_summary("Created", format_timestamp(&task.created_at));
    human.push_summary("Updated", format_timestamp(&task.updated_at));
    if let Some(completed_at) = task.completed_at.as_ref() {
        human.push_summary("Completed", format_timestamp(completed_at));
    }
    human
}

pub fn stats_human(stats: &Stats) -> HumanOutput {
    let mut human = HumanOutput::new("Task statistics");
    human.push_summary("Total", stats.total.to_string());
    human.push_summary("Pending", stats.pending.to_string());
    human.push_summary("Completed", stats.completed.to_string());
    human.push_summary("Completion rate", stats.completion_percent());
    for priority in crate::task::Priority::ALL {
        let counts = stats.by_priority.get(priority);
        human.push_detail(format!(
            "{priority}: {} {}, {} {}",
            counts.pending,
            Status::Pending,
            counts.completed,
            Status::Completed
        ));
    }
    human
}

fn format_timestamp(value: &chrono::DateTime<chrono::Utc>) -> String {
    value.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn infer_command_name_from_args() -> String {
    let mut skip_value = false;

    for arg in std::env::args().skip(1) {
        if skip_value {
            skip_value = false;
            continue;
        }
        if arg.starts_with('-') {
            skip_value = takes_value(&arg);
            continue;
        }
        return arg;
    }

    "todo".to_string()
}

/// Global flags that consume the following argument
fn takes_value(flag: &str) -> bool {
    !flag.contains('=')
        && matches!(
            flag,
            "--file"
                | "--config"
                | "--max-todos"
                | "--max-title-length"
                | "--max-description-length"
                | "--log-level"
        )
}

fn error_hint(err: &Error) -> Option<String> {
    match err {
        Error::NotFound { .. } => Some("todo list".to_string()),
        Error::CapacityExceeded { .. } => {
            Some("todo clear-completed, or raise MAX_TODOS".to_string())
        }
        Error::StorageCorrupt { path, backup, .. } => Some(format!(
            "inspect or restore {} / {} by hand; nothing was overwritten",
            path.display(),
            backup.display()
        )),
        Error::LockFailed(_) => Some("another todo process owns this file; retry".to_string()),
        Error::InvalidConfig(_) => Some("fix the config file or environment, then retry".to_string()),
        _ => None,
    }
}

fn push_summary(lines: &mut Vec<String>, summary: &[(String, String)]) {
    if summary.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push("Summary:".to_string());
    for (key, value) in summary {
        if value.is_empty() {
            lines.push(format!("- {key}"));
        } else {
            lines.push(format!("- {key}: {value}"));
        }
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push(format!("{title}:"));
    for item in items {
        lines.push(format!("- {item}"));
    }
}
