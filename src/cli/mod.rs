//! Command-line interface for todo
//!
//! This module defines the CLI structure using clap derive macros.
//! Command implementations live in the `task` submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{Config, Overrides};
use crate::error::Result;
use crate::output::OutputOptions;
use crate::store::TaskStore;

mod task;

/// todo - persistent task list
///
/// Manage tasks stored in a single JSON snapshot with an automatic backup
/// of the previous generation.
#[derive(Parser, Debug)]
#[command(name = "todo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Storage file for the task snapshot
    #[arg(long, global = true, env = "TODO_FILE")]
    pub file: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true, env = "TODO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Maximum number of tasks
    #[arg(long, global = true, env = "MAX_TODOS")]
    pub max_todos: Option<usize>,

    /// Maximum title length in characters
    #[arg(long, global = true, env = "MAX_TITLE_LENGTH")]
    pub max_title_length: Option<usize>,

    /// Maximum description length in characters
    #[arg(long, global = true, env = "MAX_DESCRIPTION_LENGTH")]
    pub max_description_length: Option<usize>,

    /// Log filter (e.g. "info", "todo_store=debug"); RUST_LOG wins when set
    #[arg(long, global = true, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new task
    Add {
        /// Task title
        title: String,

        /// Optional description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Priority: low, medium, high
        #[arg(short, long, default_value = "medium")]
        priority: String,
    },

    /// List tasks in id order
    List {
        /// Status filter: all, pending, completed
        #[arg(long, default_value = "all")]
        status: String,

        /// Priority filter: all, low, medium, high
        #[arg(long, default_value = "all")]
        priority: String,
    },

    /// Show one task
    Show {
        /// Task id
        id: u64,
    },

    /// Change title, description or priority of a task
    Update {
        /// Task id
        id: u64,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description (pass "" to clear it)
        #[arg(long)]
        description: Option<String>,

        /// New priority: low, medium, high
        #[arg(long)]
        priority: Option<String>,
    },

    /// Mark a task completed
    Complete {
        /// Task id
        id: u64,
    },

    /// Move a completed task back to pending
    Reopen {
        /// Task id
        id: u64,
    },

    /// Delete a task permanently
    Delete {
        /// Task id
        id: u64,
    },

    /// Delete every completed task
    ClearCompleted,

    /// Show task statistics
    Stats,

    /// Check that the storage file is readable and writable
    Health,

    /// Invoke a named tool with JSON arguments
    Call {
        /// Tool name (see `todo tools`)
        tool: String,

        /// JSON object with the tool arguments
        args: Option<String>,
    },

    /// List the tool names accepted by `call`
    Tools,
}

impl Cli {
    /// Resolve configuration: config file, then flags and environment
    pub fn load_config(&self) -> Result<Config> {
        Config::load_or_default(self.config.as_deref())?.with_overrides(Overrides {
            storage_path: self.file.clone(),
            max_tasks: self.max_todos,
            max_title_length: self.max_title_length,
            max_description_length: self.max_description_length,
            log_level: self.log_level.clone(),
        })
    }

    /// Run the selected command, returning the process exit code
    pub fn run(self, config: Config) -> Result<i32> {
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };

        let open = move || TaskStore::open(config);
        match self.command {
            Commands::Add {
                title,
                description,
                priority,
            } => task::run_add(
                &open()?,
                task::AddOptions {
                    title,
                    description,
                    priority,
                },
                output,
            ),
            Commands::List { status, priority } => {
                task::run_list(&open()?, task::ListOptions { status, priority }, output)
            }
            Commands::Show { id } => task::run_show(&open()?, id, output),
            Commands::Update {
                id,
                title,
                description,
                priority,
            } => task::run_update(
                &open()?,
                task::UpdateOptions {
                    id,
                    title,
                    description,
                    priority,
                },
                output,
            ),
            Commands::Complete { id } => task::run_complete(&open()?, id, output),
            Commands::Reopen { id } => task::run_reopen(&open()?, id, output),
            Commands::Delete { id } => task::run_delete(&open()?, id, output),
            Commands::ClearCompleted => task::run_clear_completed(&open()?, output),
            Commands::Stats => task::run_stats(&open()?, output),
            Commands::Health => return task::run_health(&open()?, output),
            Commands::Call { tool, args } => {
                task::run_call(&open()?, &tool, args.as_deref(), output)
            }
            // Needs no store, so no lock is taken.
            Commands::Tools => task::run_tools(output),
        }?;

        Ok(crate::error::exit_codes::SUCCESS)
    }
}
