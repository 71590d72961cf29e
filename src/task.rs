//! Task records and field validation.
//!
//! A [`Task`] is created from a [`NewTask`] and changed through a
//! [`TaskChanges`] changeset. Both paths trim text fields and enforce the
//! configured [`Limits`]; ids and timestamps are assigned here, never taken
//! from the caller.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Limits;
use crate::error::{Error, Result};

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        Priority::ALL
            .into_iter()
            .find(|priority| priority.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                Error::validation(
                    "priority",
                    format!("'{trimmed}' must be one of: low, medium, high"),
                )
            })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Completed,
}

impl Status {
    pub const ALL: [Status; 2] = [Status::Pending, Status::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        Status::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                Error::validation(
                    "status",
                    format!("'{trimmed}' must be one of: pending, completed"),
                )
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Caller-supplied fields for a new task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// Changeset for `update`: `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.priority.is_none()
    }
}

impl Task {
    /// Build a validated pending task with server-assigned id and timestamps.
    pub fn create(id: u64, fields: NewTask, limits: &Limits, now: DateTime<Utc>) -> Result<Self> {
        let title = validate_title(&fields.title, limits)?;
        let description = validate_description(&fields.description, limits)?;
        Ok(Self {
            id,
            title,
            description,
            priority: fields.priority,
            status: Status::Pending,
            created_at: now,
            updated_at: now,
            completed_at: None,
        })
    }

    /// Apply a changeset. All supplied fields are validated before any is
    /// written, so a rejected changeset leaves the task untouched.
    pub fn apply(&mut self, changes: TaskChanges, limits: &Limits, now: DateTime<Utc>) -> Result<()> {
        if changes.is_empty() {
            return Err(Error::validation(
                "changes",
                "at least one of title, description, priority is required",
            ));
        }
        let title = changes
            .title
            .as_deref()
            .map(|title| validate_title(title, limits))
            .transpose()?;
        let description = changes
            .description
            .as_deref()
            .map(|description| validate_description(description, limits))
            .transpose()?;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        self.touch(now);
        Ok(())
    }

    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = Status::Completed;
        self.touch(now);
        self.completed_at = Some(self.updated_at);
    }

    pub fn reopen(&mut self, now: DateTime<Utc>) {
        self.status = Status::Pending;
        self.completed_at = None;
        self.touch(now);
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// Move `updated_at` strictly forward, even when the clock has not.
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }

    /// Check the record-level invariants of a task read back from storage.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if self.id == 0 {
            return Err("task id 0 is not allowed".to_string());
        }
        if self.updated_at < self.created_at {
            return Err(format!("task {} updated before it was created", self.id));
        }
        match (self.status, self.completed_at) {
            (Status::Completed, None) => Err(format!(
                "task {} is completed without completed_at",
                self.id
            )),
            (Status::Pending, Some(_)) => Err(format!(
                "task {} is pending but has completed_at",
                self.id
            )),
            _ => Ok(()),
        }
    }
}

fn validate_title(raw: &str, limits: &Limits) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(Error::validation("title", "cannot be empty"));
    }
    check_length("title", title, limits.max_title_length)?;
    Ok(title.to_string())
}

fn validate_description(raw: &str, limits: &Limits) -> Result<String> {
    let description = raw.trim();
    check_length("description", description, limits.max_description_length)?;
    Ok(description.to_string())
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(Error::validation(
            field,
            format!("exceeds maximum length of {max} characters (got {len})"),
        ));
    }
    Ok(())
}
