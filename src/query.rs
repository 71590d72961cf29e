//! Task filters and aggregate statistics.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::task::{Priority, Status, Task};

/// Status predicate for `list`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    pub fn matches(self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        value
            .parse::<Status>()
            .map(StatusFilter::Only)
            .map_err(|_| {
                Error::validation(
                    "status",
                    format!("'{}' must be one of: all, pending, completed", value.trim()),
                )
            })
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => fmt::Display::fmt(status, f),
        }
    }
}

/// Priority predicate for `list`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl PriorityFilter {
    pub fn matches(self, priority: Priority) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::Only(wanted) => wanted == priority,
        }
    }
}

impl FromStr for PriorityFilter {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(PriorityFilter::All);
        }
        value
            .parse::<Priority>()
            .map(PriorityFilter::Only)
            .map_err(|_| {
                Error::validation(
                    "priority",
                    format!(
                        "'{}' must be one of: all, low, medium, high",
                        value.trim()
                    ),
                )
            })
    }
}

impl fmt::Display for PriorityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityFilter::All => f.write_str("all"),
            PriorityFilter::Only(priority) => fmt::Display::fmt(priority, f),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: StatusFilter,
    pub priority: PriorityFilter,
}

impl TaskFilter {
    pub fn new(status: StatusFilter, priority: PriorityFilter) -> Self {
        Self { status, priority }
    }

    /// Build a filter from the `all`/enum spellings used by callers
    pub fn parse(status: &str, priority: &str) -> Result<Self> {
        Ok(Self {
            status: status.parse()?,
            priority: priority.parse()?,
        })
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.matches(task.status) && self.priority.matches(task.priority)
    }
}

/// Tasks matching `filter`, cloned in iteration order
pub fn select<'a>(tasks: impl IntoIterator<Item = &'a Task>, filter: &TaskFilter) -> Vec<Task> {
    tasks
        .into_iter()
        .filter(|task| filter.matches(task))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub completed: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.completed
    }

    fn record(&mut self, status: Status) {
        match status {
            Status::Pending => self.pending += 1,
            Status::Completed => self.completed += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityBreakdown {
    pub low: StatusCounts,
    pub medium: StatusCounts,
    pub high: StatusCounts,
}

impl PriorityBreakdown {
    pub fn get(&self, priority: Priority) -> &StatusCounts {
        match priority {
            Priority::Low => &self.low,
            Priority::Medium => &self.medium,
            Priority::High => &self.high,
        }
    }

    fn get_mut(&mut self, priority: Priority) -> &mut StatusCounts {
        match priority {
            Priority::Low => &mut self.low,
            Priority::Medium => &mut self.medium,
            Priority::High => &mut self.high,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    /// `completed / total` in `[0, 1]`; 0 for an empty store
    pub completion_rate: f64,
    pub by_priority: PriorityBreakdown,
}

impl Stats {
    pub fn compute<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut counts = StatusCounts::default();
        let mut by_priority = PriorityBreakdown::default();
        for task in tasks {
            counts.record(task.status);
            by_priority.get_mut(task.priority).record(task.status);
        }

        let total = counts.total();
        let completion_rate = if total == 0 {
            0.0
        } else {
            counts.completed as f64 / total as f64
        };

        Self {
            total,
            pending: counts.pending,
            completed: counts.completed,
            completion_rate,
            by_priority,
        }
    }

    /// Completion rate as a percentage with one decimal, e.g. `"66.7%"`
    pub fn completion_percent(&self) -> String {
        format!("{:.1}%", self.completion_rate * 100.0)
    }
}
