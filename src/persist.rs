//! Snapshot persistence
//!
//! The whole store is one JSON document written next to its backup:
//!
//! ```text
//! todos.json            # primary snapshot (current generation)
//! todos.json.bak        # previous generation, refreshed before every save
//! todos.json.tmp.<pid>  # only exists while a save is in flight
//! todos.json.lock       # advisory lock held by the owning process
//! ```
//!
//! A save copies the primary to the backup, writes the new snapshot to the
//! temp file and renames it over the primary. The rename is the only step
//! that makes a save visible, so a crash at any point leaves a loadable
//! primary behind.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::lock;
use crate::task::Task;

/// Schema tag written into every snapshot
pub const SCHEMA_VERSION: &str = "todo.tasks.v1";

/// Complete persisted state: every task plus the id counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: String,
    /// Highest id ever allocated; the next task gets `last_id + 1`
    pub last_id: u64,
    #[serde(with = "tasks_by_id")]
    pub tasks: BTreeMap<u64, Task>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            last_id: 0,
            tasks: BTreeMap::new(),
        }
    }

    /// Highest id currently stored (0 when empty)
    pub fn max_id(&self) -> u64 {
        self.tasks.keys().next_back().copied().unwrap_or(0)
    }

    /// Structural checks beyond what deserialization enforces
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(format!(
                "unsupported schema_version '{}' (expected {SCHEMA_VERSION})",
                self.schema_version
            ));
        }
        if self.last_id == u64::MAX || self.max_id() == u64::MAX {
            return Err(format!("id counter at {} leaves no ids to allocate", u64::MAX));
        }
        for (id, task) in &self.tasks {
            if *id != task.id {
                return Err(format!("task keyed {id} carries id {}", task.id));
            }
            task.check_invariants()?;
        }
        Ok(())
    }

    /// Raise a lagging counter to the highest stored id.
    ///
    /// Returns true when the counter had to move.
    pub fn repair_counter(&mut self) -> bool {
        let max_id = self.max_id();
        if self.last_id < max_id {
            self.last_id = max_id;
            return true;
        }
        false
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Tasks are stored as an id-ordered array; duplicate ids are rejected.
mod tasks_by_id {
    use std::collections::BTreeMap;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::task::Task;

    pub fn serialize<S: Serializer>(
        tasks: &BTreeMap<u64, Task>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(tasks.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<u64, Task>, D::Error> {
        let list = Vec::<Task>::deserialize(deserializer)?;
        let mut tasks = BTreeMap::new();
        for task in list {
            let id = task.id;
            if tasks.insert(id, task).is_some() {
                return Err(D::Error::custom(format!("duplicate task id {id}")));
            }
        }
        Ok(tasks)
    }
}

/// Parse and validate snapshot bytes, describing any failure.
pub fn parse_snapshot(bytes: &[u8]) -> std::result::Result<Snapshot, String> {
    let snapshot: Snapshot = serde_json::from_slice(bytes).map_err(|err| err.to_string())?;
    snapshot.validate()?;
    Ok(snapshot)
}

/// Owner of the primary, backup and temp files for one storage path
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
    backup_path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let backup_path = lock::sibling_path(&path, "bak");
        Self { path, backup_path }
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Temp file this process writes before renaming over the primary
    pub fn temp_path(&self) -> PathBuf {
        lock::temp_path_for(&self.path)
    }

    /// Lock file guarding ownership of the storage path
    pub fn lock_path(&self) -> PathBuf {
        lock::sibling_path(&self.path, "lock")
    }

    /// Directory holding all of the files above
    pub fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    // =========================================================================
    // Load / save
    // =========================================================================

    /// Load the current snapshot.
    ///
    /// A missing primary yields an empty snapshot. An unparsable primary
    /// falls back to the backup; if that is unusable too the load fails with
    /// `StorageCorrupt` instead of starting empty.
    pub fn load(&self) -> Result<Snapshot> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no storage file, starting empty");
                return Ok(Snapshot::empty());
            }
            Err(err) => return Err(Error::Io(err)),
        };

        let mut snapshot = match parse_snapshot(&bytes) {
            Ok(snapshot) => snapshot,
            Err(reason) => {
                warn!(
                    path = %self.path.display(),
                    %reason,
                    "storage file unreadable, trying backup"
                );
                self.load_backup(reason)?
            }
        };

        if snapshot.repair_counter() {
            warn!(
                last_id = snapshot.last_id,
                "id counter lagged behind stored ids, raised to highest id"
            );
        }
        debug!(
            path = %self.path.display(),
            tasks = snapshot.tasks.len(),
            last_id = snapshot.last_id,
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    fn load_backup(&self, reason: String) -> Result<Snapshot> {
        let corrupt = |detail: String| Error::StorageCorrupt {
            path: self.path.clone(),
            backup: self.backup_path.clone(),
            reason: format!("{reason}; backup: {detail}"),
        };

        let bytes = fs::read(&self.backup_path).map_err(|err| corrupt(err.to_string()))?;
        let snapshot = parse_snapshot(&bytes).map_err(corrupt)?;
        warn!(
            backup = %self.backup_path.display(),
            tasks = snapshot.tasks.len(),
            "recovered store from backup"
        );
        Ok(snapshot)
    }

    /// Persist `snapshot`: refresh the backup, then write temp and rename.
    ///
    /// On error the primary file is unchanged.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let dir = self.dir();
        fs::create_dir_all(dir).map_err(|source| Error::Storage {
            path: dir.to_path_buf(),
            source,
        })?;

        self.refresh_backup()?;

        let json = serde_json::to_vec_pretty(snapshot)?;
        lock::write_atomic(&self.path, &json)?;
        debug!(
            path = %self.path.display(),
            tasks = snapshot.tasks.len(),
            bytes = json.len(),
            "saved snapshot"
        );
        Ok(())
    }

    /// Copy the committed primary to the backup path.
    ///
    /// A primary that does not parse is left out so it never replaces a
    /// good backup.
    fn refresh_backup(&self) -> Result<()> {
        let current = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(Error::Storage {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if let Err(reason) = parse_snapshot(&current) {
            warn!(%reason, "primary is not a valid snapshot, keeping existing backup");
            return Ok(());
        }

        lock::write_atomic(&self.backup_path, &current)
    }
}
