//! Local snapshot persistence: JSON file + rotating backups.
//!
//! Write protocol for every save:
//! 1. copy the live file to `backups/config_backup_<timestamp>.json`
//! 2. prune backups down to the newest `max_backups`
//! 3. write the new snapshot to a temp file in the same directory
//! 4. rename the temp file over `settings.json`
//!
//! Only steps 3-4 can fail a save. Backup and prune problems are logged.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::config::backup::{FILE_PREFIX, MAX_BACKUPS};
use crate::core::error::{AppError, AppResult};
use crate::storage::snapshot::Snapshot;

/// Canonical snapshot filename inside the config directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Backups subdirectory inside the config directory
pub const BACKUP_DIR: &str = "backups";

/// Staged snapshots are `.settings.json.<uuid>.tmp` next to the live file
const TEMP_PREFIX: &str = ".settings.json.";
const TEMP_SUFFIX: &str = ".tmp";

/// Sortable, filename-safe timestamp (ISO-8601 with `:` and `.` as `-`)
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S-%6fZ";

/// Durable storage for the settings snapshot.
#[async_trait]
pub trait LocalPersistence: Send + Sync {
    /// Creates whatever directories the backend needs.
    async fn prepare(&self) -> AppResult<()>;

    /// Reads the current snapshot, `None` if none was ever written.
    async fn load(&self) -> AppResult<Option<Snapshot>>;

    /// Durably replaces the current snapshot.
    async fn save(&self, snapshot: &Snapshot) -> AppResult<()>;
}

/// `settings.json` + `backups/` under one config directory.
pub struct JsonFilePersistence {
    config_file: PathBuf,
    backup_dir: PathBuf,
    max_backups: usize,
    last_backup_at: Mutex<Option<DateTime<Utc>>>,
}

impl JsonFilePersistence {
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        let config_dir = config_dir.as_ref();
        Self {
            config_file: config_dir.join(SETTINGS_FILE),
            backup_dir: config_dir.join(BACKUP_DIR),
            max_backups: MAX_BACKUPS,
            last_backup_at: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn max_backups(mut self, max: usize) -> Self {
        self.max_backups = max;
        self
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Writes `snapshot` to a fresh temp file next to the live file.
    ///
    /// Nothing is visible to readers until [`commit`](Self::commit). A failed
    /// write removes its partial temp file.
    pub async fn stage(&self, snapshot: &Snapshot) -> AppResult<PathBuf> {
        let content = serde_json::to_string_pretty(snapshot)?;
        let tmp_path = self
            .config_dir()
            .join(format!("{}{}{}", TEMP_PREFIX, uuid::Uuid::new_v4().simple(), TEMP_SUFFIX));
        if let Err(e) = tokio::fs::write(&tmp_path, content).await {
            discard_temp(&tmp_path).await;
            return Err(AppError::Persistence(format!(
                "Failed to write temp snapshot {}: {}",
                tmp_path.display(),
                e
            )));
        }
        Ok(tmp_path)
    }

    /// Atomically moves a staged temp file over the live snapshot.
    pub async fn commit(&self, tmp_path: &Path) -> AppResult<()> {
        if let Err(e) = tokio::fs::rename(tmp_path, &self.config_file).await {
            discard_temp(tmp_path).await;
            return Err(AppError::Persistence(format!("Failed to rename snapshot into place: {}", e)));
        }
        Ok(())
    }

    /// Removes temp files left behind by writes that never reached
    /// [`commit`](Self::commit). Returns how many were removed.
    pub async fn sweep_temp_files(&self) -> AppResult<usize> {
        let mut entries = match tokio::fs::read_dir(self.config_dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !(name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)) {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => {
                    removed += 1;
                    log::info!("Removed stale temp snapshot: {}", entry.path().display());
                }
                Err(e) => log::warn!("Failed to remove stale temp snapshot {}: {}", entry.path().display(), e),
            }
        }
        Ok(removed)
    }

    fn config_dir(&self) -> &Path {
        self.config_file.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Copies the live file into the backups directory, if there is one.
    pub async fn create_backup(&self) -> AppResult<Option<PathBuf>> {
        if !tokio::fs::try_exists(&self.config_file).await.unwrap_or(false) {
            return Ok(None);
        }
        let backup_path = self
            .backup_dir
            .join(format!("{}{}.json", FILE_PREFIX, self.next_backup_stamp()));
        tokio::fs::copy(&self.config_file, &backup_path).await?;
        log::info!("Created settings backup: {}", backup_path.display());
        Ok(Some(backup_path))
    }

    /// Timestamp for the next backup, strictly later than the previous one
    /// so rapid saves never share a filename.
    fn next_backup_stamp(&self) -> String {
        let mut last = self.last_backup_at.lock().unwrap_or_else(|e| e.into_inner());
        let mut now = Utc::now();
        if let Some(prev) = *last {
            if now <= prev {
                now = prev + ChronoDuration::microseconds(1);
            }
        }
        *last = Some(now);
        now.format(BACKUP_TIMESTAMP_FORMAT).to_string()
    }

    /// Backup files, newest first (filenames sort chronologically).
    pub async fn list_backups(&self) -> AppResult<Vec<PathBuf>> {
        let mut backups = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.backup_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(backups),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(FILE_PREFIX) && name.ends_with(".json") {
                backups.push(entry.path());
            }
        }
        backups.sort();
        backups.reverse();
        Ok(backups)
    }

    /// Deletes all but the newest `max_backups` backups. Returns how many went.
    pub async fn prune_backups(&self) -> AppResult<usize> {
        let backups = self.list_backups().await?;
        let mut removed = 0;
        for path in backups.iter().skip(self.max_backups) {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {
                    removed += 1;
                    log::info!("Removed old backup: {}", path.display());
                }
                Err(e) => log::warn!("Failed to remove old backup {}: {}", path.display(), e),
            }
        }
        Ok(removed)
    }

    /// Replaces the live snapshot with a backup. The current file is backed
    /// up first so a restore can itself be undone.
    pub async fn restore_backup(&self, backup_path: &Path) -> AppResult<Snapshot> {
        let content = tokio::fs::read_to_string(backup_path).await?;
        let snapshot: Snapshot = serde_json::from_str(&content)
            .map_err(|e| AppError::Validation(format!("Backup {} is not a valid snapshot: {}", backup_path.display(), e)))?;

        if let Err(e) = self.create_backup().await {
            log::warn!("Backup before restore failed: {}", e);
        }
        let tmp = self.stage(&snapshot).await?;
        self.commit(&tmp).await?;
        log::info!("Restored settings from backup: {}", backup_path.display());
        Ok(snapshot)
    }
}

#[async_trait]
impl LocalPersistence for JsonFilePersistence {
    async fn prepare(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(self.config_dir()).await?;
        tokio::fs::create_dir_all(&self.backup_dir).await?;
        if let Err(e) = self.sweep_temp_files().await {
            log::warn!("⚠️ Temp snapshot cleanup failed: {}", e);
        }
        Ok(())
    }

    async fn load(&self) -> AppResult<Option<Snapshot>> {
        let content = match tokio::fs::read_to_string(&self.config_file).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn save(&self, snapshot: &Snapshot) -> AppResult<()> {
        if let Err(e) = self.create_backup().await {
            log::warn!("⚠️ Backup creation failed: {}", e);
        }
        if let Err(e) = self.prune_backups().await {
            log::warn!("⚠️ Backup pruning failed: {}", e);
        }

        let tmp = self.stage(snapshot).await?;
        self.commit(&tmp).await?;
        log::info!("✅ Settings saved to {}", self.config_file.display());
        Ok(())
    }
}

async fn discard_temp(tmp_path: &Path) {
    match tokio::fs::remove_file(tmp_path).await {
        Ok(()) => log::debug!("Discarded temp snapshot {}", tmp_path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("⚠️ Failed to discard temp snapshot {}: {}", tmp_path.display(), e),
    }
}
