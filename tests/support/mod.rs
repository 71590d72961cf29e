#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;
use todo_store::config::Config;
use todo_store::store::TaskStore;

/// A scratch directory holding one storage file
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn storage_path(&self) -> PathBuf {
        self.dir.path().join("todos.json")
    }

    pub fn backup_path(&self) -> PathBuf {
        self.dir.path().join("todos.json.bak")
    }

    pub fn config(&self) -> Config {
        Config {
            storage_path: self.storage_path(),
            lock_timeout_ms: 200,
            ..Config::default()
        }
    }

    pub fn open(&self) -> todo_store::Result<TaskStore> {
        TaskStore::open(self.config())
    }

    pub fn open_with(&self, configure: impl FnOnce(&mut Config)) -> todo_store::Result<TaskStore> {
        let mut config = self.config();
        configure(&mut config);
        TaskStore::open(config)
    }

    pub fn read_primary(&self) -> Result<Value, Box<dyn std::error::Error>> {
        Ok(serde_json::from_slice(&fs::read(self.storage_path())?)?)
    }

    pub fn write_file(&self, name: &str, contents: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// `todo` pointed at this directory's storage file
    pub fn cmd(&self) -> Command {
        let mut cmd = todo_cmd();
        cmd.current_dir(self.path());
        cmd.env("TODO_FILE", self.storage_path());
        cmd
    }

    /// Run `todo --json <args>` and return the parsed envelope
    pub fn json(&self, args: &[&str]) -> Result<Value, Box<dyn std::error::Error>> {
        let output = self.cmd().arg("--json").args(args).output()?;
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

/// `todo` with the environment cleared of settings that would leak in
pub fn todo_cmd() -> Command {
    let mut cmd = Command::cargo_bin("todo").expect("binary");
    for var in [
        "TODO_FILE",
        "TODO_CONFIG",
        "MAX_TODOS",
        "MAX_TITLE_LENGTH",
        "MAX_DESCRIPTION_LENGTH",
        "LOG_LEVEL",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}
