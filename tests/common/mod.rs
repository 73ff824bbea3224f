//! Common test utilities
//!
//! Shared across the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use hybridbot::storage::{Snapshot, SettingsStore};
use tempfile::TempDir;

/// Isolated config directory with an initialized store.
pub struct TestEnvironment {
    pub dir: TempDir,
    pub store: SettingsStore,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let store = SettingsStore::open(dir.path());
        store.initialize().await.expect("initialize store");
        Self { dir, store }
    }

    pub fn config_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn settings_file(&self) -> PathBuf {
        self.dir.path().join("settings.json")
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.dir.path().join("backups")
    }
}

/// Backup filenames, oldest first.
pub fn backup_names(backup_dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(backup_dir)
        .expect("read backups")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("config_backup_"))
        .collect();
    names.sort();
    names
}

pub fn read_snapshot(path: &Path) -> Snapshot {
    let content = std::fs::read_to_string(path).expect("read snapshot");
    serde_json::from_str(&content).expect("valid snapshot")
}
