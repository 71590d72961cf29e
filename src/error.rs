//! Error types for the todo store
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad input, unknown id, store full)
//! - 3: Store unavailable (corrupt storage, lock held by another process)
//! - 4: Operation failed (I/O, serialization)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the todo CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const STORE_UNAVAILABLE: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for store operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("{operation}: task {id} not found")]
    NotFound { operation: &'static str, id: u64 },

    #[error("Maximum number of tasks ({limit}) reached")]
    CapacityExceeded { limit: usize },

    #[error("Task {0} is already completed")]
    AlreadyCompleted(u64),

    #[error("Task {0} is already pending")]
    AlreadyPending(u64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    // Store unavailable (exit code 3)
    #[error("Storage corrupt: {path} ({reason}); backup {backup} is unusable too")]
    StorageCorrupt {
        path: PathBuf,
        backup: PathBuf,
        reason: String,
    },

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    // Operation failures (exit code 4)
    #[error("Failed to write {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Task ids exhausted: counter is at {last_id}")]
    IdsExhausted { last_id: u64 },

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::Validation { .. }
            | Error::NotFound { .. }
            | Error::CapacityExceeded { .. }
            | Error::AlreadyCompleted(_)
            | Error::AlreadyPending(_)
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::UnknownTool(_) => exit_codes::USER_ERROR,

            // Store unavailable
            Error::StorageCorrupt { .. } | Error::LockFailed(_) => exit_codes::STORE_UNAVAILABLE,

            // Operation failures
            Error::Storage { .. }
            | Error::IdsExhausted { .. }
            | Error::LockPoisoned
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Short machine-readable name of the error variant
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "validation",
            Error::NotFound { .. } => "not_found",
            Error::CapacityExceeded { .. } => "capacity_exceeded",
            Error::AlreadyCompleted(_) => "already_completed",
            Error::AlreadyPending(_) => "already_pending",
            Error::InvalidConfig(_) => "invalid_config",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::UnknownTool(_) => "unknown_tool",
            Error::StorageCorrupt { .. } => "storage_corrupt",
            Error::LockFailed(_) => "lock_failed",
            Error::Storage { .. } => "storage",
            Error::IdsExhausted { .. } => "ids_exhausted",
            Error::LockPoisoned => "lock_poisoned",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::TomlParse(_) | Error::TomlSerialize(_) => "toml",
        }
    }

    /// Structured context for the error, if any
    pub fn details(&self) -> Option<serde_json::Value> {
        use serde_json::json;

        match self {
            Error::Validation { field, message } => {
                Some(json!({ "field": field, "message": message }))
            }
            Error::NotFound { operation, id } => {
                Some(json!({ "operation": operation, "id": id }))
            }
            Error::CapacityExceeded { limit } => Some(json!({ "limit": limit })),
            Error::AlreadyCompleted(id) | Error::AlreadyPending(id) => Some(json!({ "id": id })),
            Error::InvalidConfig(message) | Error::InvalidArgument(message) => {
                Some(json!({ "message": message }))
            }
            Error::UnknownTool(name) => Some(json!({ "tool": name })),
            Error::StorageCorrupt {
                path,
                backup,
                reason,
            } => Some(json!({
                "path": path.display().to_string(),
                "backup": backup.display().to_string(),
                "reason": reason,
            })),
            Error::LockFailed(path) => Some(json!({ "path": path.display().to_string() })),
            Error::IdsExhausted { last_id } => Some(json!({ "last_id": last_id })),
            Error::Storage { path, source } => Some(json!({
                "path": path.display().to_string(),
                "cause": source.to_string(),
            })),
            _ => None,
        }
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
