//! todo-store - persistent task list
//!
//! A small task store that keeps every task in one JSON snapshot file,
//! rotates the previous generation into a backup, and exposes its
//! operations both as a library and through the `todo` CLI.
//!
//! # Core Concepts
//!
//! - **Tasks**: titled items with a priority, a pending/completed status and
//!   UTC timestamps; ids are allocated from a counter and never reused
//! - **Snapshot**: the whole store serialized as one document, written
//!   atomically (temp file, fsync, rename)
//! - **Backup**: the last readable generation, used when the primary is corrupt
//! - **Tools**: named operations taking JSON arguments, for transports
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration from TOML, environment and flags
//! - `error`: Error types, exit codes and result aliases
//! - `lock`: File locking and atomic writes
//! - `output`: Human and JSON output envelopes
//! - `persist`: Snapshot file format, load with backup fallback, save
//! - `query`: Filters and statistics
//! - `store`: The shared `TaskStore`
//! - `task`: Task record, priority and status
//! - `tools`: Named tool dispatch over JSON arguments

pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod output;
pub mod persist;
pub mod query;
pub mod store;
pub mod task;
pub mod tools;

pub use config::Config;
pub use error::{Error, Result};
pub use query::{Stats, TaskFilter};
pub use store::{HealthReport, TaskStore, Transition};
pub use task::{NewTask, Priority, Status, Task, TaskChanges};
