//! The task store: an in-memory id → task map mirrored to a snapshot file.
//!
//! Every operation takes the store mutex. Mutations run against a draft
//! copy of the state; the draft is saved to disk and only then swapped in,
//! so a failed save leaves both memory and disk at the previous snapshot.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{Config, Limits};
use crate::error::{Error, Result};
use crate::lock::FileLock;
use crate::persist::{parse_snapshot, Snapshot, SnapshotFile};
use crate::query::{self, Stats, TaskFilter};
use crate::task::{NewTask, Status, Task, TaskChanges};

/// Outcome of `complete` / `reopen`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Changed(Task),
    /// `complete` on a task that was already completed; nothing was saved
    AlreadyCompleted(Task),
    /// `reopen` on a task that was already pending; nothing was saved
    AlreadyPending(Task),
}

impl Transition {
    pub fn task(&self) -> &Task {
        match self {
            Transition::Changed(task)
            | Transition::AlreadyCompleted(task)
            | Transition::AlreadyPending(task) => task,
        }
    }

    pub fn into_task(self) -> Task {
        match self {
            Transition::Changed(task)
            | Transition::AlreadyCompleted(task)
            | Transition::AlreadyPending(task) => task,
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, Transition::Changed(_))
    }

    /// The changed task, or the informational no-op as an error value
    pub fn into_changed(self) -> Result<Task> {
        match self {
            Transition::Changed(task) => Ok(task),
            Transition::AlreadyCompleted(task) => Err(Error::AlreadyCompleted(task.id)),
            Transition::AlreadyPending(task) => Err(Error::AlreadyPending(task.id)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub ok: bool,
    pub details: HealthDetails,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthDetails {
    pub storage_path: PathBuf,
    pub primary_exists: bool,
    /// The primary is absent or parses as a valid snapshot
    pub readable: bool,
    /// A probe file can be created in the storage directory
    pub writable: bool,
    /// The primary on disk holds exactly the in-memory state
    pub in_sync: bool,
    pub task_count: usize,
    pub max_tasks: usize,
    pub last_id: u64,
    pub max_id: u64,
    pub counter_consistent: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
    pub checked_at: DateTime<Utc>,
}

enum Change<T> {
    Save(T),
    Unchanged(T),
}

/// Shared, persistent task collection
///
/// Construct once with [`TaskStore::open`] and share by reference or `Arc`.
#[derive(Debug)]
pub struct TaskStore {
    config: Config,
    file: SnapshotFile,
    state: Mutex<Snapshot>,
    _owner: FileLock,
}

impl TaskStore {
    /// Take ownership of the storage file and load its snapshot.
    ///
    /// Fails with `LockFailed` while another process owns the file and with
    /// `StorageCorrupt` when neither the primary nor the backup is usable.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let file = SnapshotFile::new(&config.storage_path);
        let owner = FileLock::acquire(file.lock_path(), config.lock_timeout_ms)?;
        let snapshot = file.load()?;

        if snapshot.tasks.len() > config.max_tasks {
            warn!(
                tasks = snapshot.tasks.len(),
                max_tasks = config.max_tasks,
                "store holds more tasks than max_tasks; creation disabled until it shrinks"
            );
        }
        info!(
            path = %file.path().display(),
            tasks = snapshot.tasks.len(),
            last_id = snapshot.last_id,
            "opened task store"
        );

        Ok(Self {
            config,
            file,
            state: Mutex::new(snapshot),
            _owner: owner,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn limits(&self) -> Limits {
        self.config.limits()
    }

    pub fn storage_path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.state()?.tasks.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // =========================================================================
    // CRUD
    // =========================================================================

    pub fn create(&self, fields: NewTask) -> Result<Task> {
        let limits = self.limits();
        let max_tasks = self.config.max_tasks;
        let task = self.mutate("create", |state| {
            if state.tasks.len() >= max_tasks {
                return Err(Error::CapacityExceeded { limit: max_tasks });
            }
            let id = state
                .last_id
                .checked_add(1)
                .ok_or(Error::IdsExhausted {
                    last_id: state.last_id,
                })?;
            let task = Task::create(id, fields, &limits, Utc::now())?;
            state.last_id = id;
            state.tasks.insert(id, task.clone());
            Ok(Change::Save(task))
        })?;
        info!(id = task.id, title = %task.title, "created task");
        Ok(task)
    }

    pub fn get(&self, id: u64) -> Result<Task> {
        let state = self.state()?;
        state
            .tasks
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound { operation: "get", id })
    }

    /// Tasks matching `filter` in ascending id order
    pub fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let state = self.state()?;
        let tasks = query::select(state.tasks.values(), filter);
        debug!(
            status = %filter.status,
            priority = %filter.priority,
            matched = tasks.len(),
            "listed tasks"
        );
        Ok(tasks)
    }

    pub fn update(&self, id: u64, changes: TaskChanges) -> Result<Task> {
        let limits = self.limits();
        let task = self.mutate("update", |state| {
            let task = find_mut(state, "update", id)?;
            task.apply(changes, &limits, Utc::now())?;
            Ok(Change::Save(task.clone()))
        })?;
        info!(id, "updated task");
        Ok(task)
    }

    pub fn complete(&self, id: u64) -> Result<Transition> {
        self.mutate("complete", |state| {
            let task = find_mut(state, "complete", id)?;
            if task.is_completed() {
                return Ok(Change::Unchanged(Transition::AlreadyCompleted(task.clone())));
            }
            task.complete(Utc::now());
            Ok(Change::Save(Transition::Changed(task.clone())))
        })
    }

    pub fn reopen(&self, id: u64) -> Result<Transition> {
        self.mutate("reopen", |state| {
            let task = find_mut(state, "reopen", id)?;
            if task.status == Status::Pending {
                return Ok(Change::Unchanged(Transition::AlreadyPending(task.clone())));
            }
            task.reopen(Utc::now());
            Ok(Change::Save(Transition::Changed(task.clone())))
        })
    }

    /// Remove a task for good; its id is never handed out again.
    pub fn delete(&self, id: u64) -> Result<Task> {
        let task = self.mutate("delete", |state| {
            let task = state
                .tasks
                .remove(&id)
                .ok_or(Error::NotFound { operation: "delete", id })?;
            Ok(Change::Save(task))
        })?;
        info!(id, "deleted task");
        Ok(task)
    }

    /// Remove every completed task with a single save.
    pub fn clear_completed(&self) -> Result<usize> {
        let removed = self.mutate("clear_completed", |state| {
            let before = state.tasks.len();
            state.tasks.retain(|_, task| !task.is_completed());
            let removed = before - state.tasks.len();
            if removed == 0 {
                return Ok(Change::Unchanged(0));
            }
            Ok(Change::Save(removed))
        })?;
        if removed > 0 {
            info!(removed, "cleared completed tasks");
        }
        Ok(removed)
    }

    // =========================================================================
    // Read-only views
    // =========================================================================

    pub fn stats(&self) -> Result<Stats> {
        let state = self.state()?;
        Ok(Stats::compute(state.tasks.values()))
    }

    /// Probe the storage file and the id counter without changing anything.
    pub fn health_check(&self) -> HealthReport {
        let mut issues = Vec::new();
        let path = self.file.path().to_path_buf();

        // Held until the disk copy has been compared, so no save lands between.
        let state = match self.state() {
            Ok(state) => Some(state),
            Err(err) => {
                issues.push(err.to_string());
                None
            }
        };

        let (primary_exists, on_disk) = match fs::read(&path) {
            Ok(bytes) => match parse_snapshot(&bytes) {
                Ok(snapshot) => (true, Some(snapshot)),
                Err(reason) => {
                    issues.push(format!("storage file is not a valid snapshot: {reason}"));
                    (true, None)
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => (false, None),
            Err(err) => {
                issues.push(format!("storage file unreadable: {err}"));
                (true, None)
            }
        };
        let readable = !primary_exists || on_disk.is_some();

        let writable = match tempfile::Builder::new()
            .prefix(".todo-health")
            .tempfile_in(self.file.dir())
        {
            Ok(_probe) => true,
            Err(err) => {
                issues.push(format!(
                    "storage directory {} not writable: {err}",
                    self.file.dir().display()
                ));
                false
            }
        };

        let memory = state.as_deref();
        let (task_count, last_id, max_id) = memory
            .map(|state| (state.tasks.len(), state.last_id, state.max_id()))
            .unwrap_or_default();
        let counter_consistent = memory.is_some() && last_id >= max_id;
        if memory.is_some() && !counter_consistent {
            issues.push(format!(
                "id counter {last_id} is behind highest stored id {max_id}"
            ));
        }

        let in_sync = match (memory, on_disk) {
            // Load raises a lagging counter without saving; compare the same way.
            (Some(memory), Some(mut disk)) => {
                disk.repair_counter();
                *memory == disk
            }
            (Some(memory), None) if !primary_exists => *memory == Snapshot::empty(),
            _ => false,
        };
        if readable && memory.is_some() && !in_sync {
            issues.push("in-memory state differs from the storage file".to_string());
        }
        drop(state);

        let ok = readable && writable && counter_consistent && in_sync;
        if ok {
            debug!(tasks = task_count, "health check passed");
        } else {
            warn!(issues = ?issues, "health check failed");
        }

        HealthReport {
            ok,
            details: HealthDetails {
                storage_path: path,
                primary_exists,
                readable,
                writable,
                in_sync,
                task_count,
                max_tasks: self.config.max_tasks,
                last_id,
                max_id,
                counter_consistent,
                issues,
                checked_at: Utc::now(),
            },
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn state(&self) -> Result<MutexGuard<'_, Snapshot>> {
        self.state.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Run `f` against a draft of the state, persist it, then commit it.
    ///
    /// The lock is held across the save so readers never observe state that
    /// is not yet on disk.
    fn mutate<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Snapshot) -> Result<Change<T>>,
    {
        let mut state = self.state()?;
        let mut draft = state.clone();

        match f(&mut draft)? {
            Change::Unchanged(value) => Ok(value),
            Change::Save(value) => {
                if let Err(err) = self.file.save(&draft) {
                    error!(operation, error = %err, "save failed, change rolled back");
                    return Err(err);
                }
                *state = draft;
                Ok(value)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn with_state_mut<T>(&self, f: impl FnOnce(&mut Snapshot) -> T) -> T {
        let mut state = self.state.lock().expect("state lock");
        f(&mut state)
    }
}

fn find_mut<'a>(state: &'a mut Snapshot, operation: &'static str, id: u64) -> Result<&'a mut Task> {
    state
        .tasks
        .get_mut(&id)
        .ok_or(Error::NotFound { operation, id })
}
