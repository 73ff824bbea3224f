//! Hybrid settings store: in-memory cache, durable JSON snapshot, optional
//! remote mirror.
//!
//! Reads (`get`, `get_all`) only touch the cache and never block on disk or
//! network. Writes go through one async mutex so backup + temp-write + rename
//! never interleave, and the cache is updated only after the snapshot is on
//! disk: a failed write leaves the previous value visible.

use dashmap::DashMap;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::storage::persistence::{JsonFilePersistence, LocalPersistence};
use crate::storage::remote::RemoteConfigProvider;
use crate::storage::restart::{RestartCoordinator, RestartMethod};
use crate::storage::snapshot::{generate_session_id, now_iso, SettingKey, SettingsMap, Snapshot, SnapshotMetadata};

pub struct SettingsStore {
    persistence: Arc<dyn LocalPersistence>,
    remote: Option<Arc<dyn RemoteConfigProvider>>,
    restarter: RestartCoordinator,
    overrides: HashMap<String, String>,
    session_id: String,
    cache: DashMap<String, String>,
    /// Held for the whole persist critical section; guards the last written metadata.
    write_lock: Mutex<SnapshotMetadata>,
}

impl SettingsStore {
    pub fn new(persistence: Arc<dyn LocalPersistence>) -> Self {
        let session_id = generate_session_id();
        Self {
            persistence,
            remote: None,
            restarter: RestartCoordinator::new(*config::PORT),
            overrides: HashMap::new(),
            cache: DashMap::new(),
            write_lock: Mutex::new(SnapshotMetadata::new(&session_id)),
            session_id,
        }
    }

    /// Store backed by `settings.json` + `backups/` in `config_dir`.
    pub fn open(config_dir: impl AsRef<Path>) -> Self {
        Self::new(Arc::new(JsonFilePersistence::new(config_dir)))
    }

    #[must_use]
    pub fn with_remote(mut self, remote: Arc<dyn RemoteConfigProvider>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// First-run values for recognized keys (usually [`SettingKey::overrides_from_env`]).
    #[must_use]
    pub fn with_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.overrides = overrides;
        self
    }

    #[must_use]
    pub fn with_restarter(mut self, restarter: RestartCoordinator) -> Self {
        self.restarter = restarter;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Prepares storage, writes the default snapshot on first run, and loads
    /// the snapshot into the cache. Safe to call again: an existing snapshot
    /// is loaded, never recreated.
    pub async fn initialize(&self) -> AppResult<()> {
        let mut metadata = self.write_lock.lock().await;
        self.persistence.prepare().await?;

        let snapshot = match self.persistence.load().await? {
            Some(snapshot) => snapshot,
            None => {
                let snapshot = Snapshot::with_defaults(&self.session_id, &self.overrides);
                self.persistence.save(&snapshot).await?;
                log::info!("✅ Created default settings snapshot");
                snapshot
            }
        };

        self.replace_cache(&snapshot.settings);
        *metadata = snapshot.metadata;
        log::info!("✅ Loaded {} settings into cache", self.cache.len());
        Ok(())
    }

    /// Reloads the cache from disk (after a backup restore, for example).
    pub async fn reload(&self) -> AppResult<()> {
        let mut metadata = self.write_lock.lock().await;
        let snapshot = self
            .persistence
            .load()
            .await?
            .ok_or_else(|| AppError::NotFound("settings snapshot".to_string()))?;
        self.replace_cache(&snapshot.settings);
        *metadata = snapshot.metadata;
        Ok(())
    }

    /// Cached value of `key`, or `fallback` when the key is absent.
    pub fn get(&self, key: &str, fallback: &str) -> String {
        self.cache
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Cached value of a recognized key, falling back to its default.
    pub fn get_setting(&self, key: SettingKey) -> String {
        self.get(key.name(), key.default_value())
    }

    /// Whether a yes/no flag is on (`yes`, `on`, `true`, `1`; case-insensitive).
    pub fn is_enabled(&self, key: SettingKey) -> bool {
        matches!(
            self.get_setting(key).trim().to_lowercase().as_str(),
            "yes" | "on" | "true" | "1"
        )
    }

    /// Point-in-time copy of every cached setting.
    pub fn get_all(&self) -> SettingsMap {
        self.cache
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Persists `key = value`, then updates the cache, then best-effort pushes
    /// the key to the remote provider. Only a failed snapshot write is an error.
    pub async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        if key.trim().is_empty() {
            return Err(AppError::Validation("setting key must not be empty".to_string()));
        }

        {
            let mut metadata = self.write_lock.lock().await;
            let mut settings = self.get_all();
            settings.insert(key.to_string(), value.to_string());
            self.persist_locked(&mut metadata, settings).await.inspect_err(|e| {
                log::error!("❌ Failed to set {}: {}", key, e);
            })?;
            self.cache.insert(key.to_string(), value.to_string());
        }

        if let Some(remote) = &self.remote {
            match remote.patch(key, value).await {
                Ok(()) => log::info!("✅ Setting {} synced to remote provider", key),
                Err(e) => log::warn!("⚠️ Remote sync failed for {}, saved locally: {}", key, e),
            }
        }
        Ok(())
    }

    /// Pulls remote values for keys already in the cache; remote wins on
    /// conflict, local-only keys are left alone. Returns how many changed.
    ///
    /// An unreachable or failing provider is logged and counts as no change.
    /// Only a failed local write is an error.
    pub async fn sync_from_remote(&self) -> AppResult<usize> {
        let Some(remote) = &self.remote else {
            return Ok(0);
        };

        let remote_vars = match remote.fetch_all().await {
            Ok(vars) => vars,
            Err(e) => {
                log::warn!("⚠️ Remote sync skipped, local settings stay authoritative: {}", e);
                return Ok(0);
            }
        };

        let mut metadata = self.write_lock.lock().await;
        let changes: Vec<(String, String)> = remote_vars
            .into_iter()
            .filter(|(key, value)| self.cache.get(key).is_some_and(|current| current.value() != value))
            .collect();
        if changes.is_empty() {
            log::debug!("Remote settings already in sync");
            return Ok(0);
        }

        let mut settings = self.get_all();
        settings.extend(changes.iter().cloned());
        self.persist_locked(&mut metadata, settings).await?;
        for (key, value) in &changes {
            self.cache.insert(key.clone(), value.clone());
        }
        log::info!("✅ Synced {} settings from remote provider", changes.len());
        Ok(changes.len())
    }

    /// Runs the restart fallback chain (local signal → platform → exit).
    pub async fn restart(&self) -> RestartMethod {
        self.restarter.restart(self.remote.as_deref()).await
    }

    /// Writes `settings` with metadata taken from the on-disk snapshot when
    /// readable, otherwise from the last metadata this store wrote.
    async fn persist_locked(&self, metadata: &mut SnapshotMetadata, settings: SettingsMap) -> AppResult<()> {
        let mut next = match self.persistence.load().await {
            Ok(Some(on_disk)) => on_disk.metadata,
            Ok(None) => metadata.clone(),
            Err(e) => {
                log::warn!("⚠️ Could not read current snapshot metadata: {}", e);
                metadata.clone()
            }
        };
        next.last_updated = Some(now_iso());
        next.session_id = self.session_id.clone();

        let snapshot = Snapshot {
            metadata: next,
            settings,
        };
        self.persistence.save(&snapshot).await?;
        *metadata = snapshot.metadata;
        Ok(())
    }

    fn replace_cache(&self, settings: &SettingsMap) {
        self.cache.clear();
        for (key, value) in settings {
            self.cache.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    /// In-memory persistence whose writes can be made to fail.
    #[derive(Default)]
    struct MemoryPersistence {
        snapshot: std::sync::Mutex<Option<Snapshot>>,
        fail_writes: AtomicBool,
    }

    #[async_trait]
    impl LocalPersistence for MemoryPersistence {
        async fn prepare(&self) -> AppResult<()> {
            Ok(())
        }

        async fn load(&self) -> AppResult<Option<Snapshot>> {
            Ok(self.snapshot.lock().unwrap().clone())
        }

        async fn save(&self, snapshot: &Snapshot) -> AppResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(AppError::Persistence("disk full".into()));
            }
            *self.snapshot.lock().unwrap() = Some(snapshot.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_initialize_seeds_defaults() {
        let store = SettingsStore::new(Arc::new(MemoryPersistence::default()));
        store.initialize().await.unwrap();
        assert_eq!(store.get_all().len(), 18);
        assert_eq!(store.get("AUTO_READ", "x"), "yes");
        assert_eq!(store.get("MISSING", "fallback"), "fallback");
        assert!(store.is_enabled(SettingKey::PublicMode));
        assert!(!store.is_enabled(SettingKey::Chatbot));
    }

    #[tokio::test]
    async fn test_empty_value_is_returned_not_fallback() {
        let store = SettingsStore::new(Arc::new(MemoryPersistence::default()));
        store.initialize().await.unwrap();
        assert_eq!(store.get("PRESENCE", "available"), "");
    }

    #[tokio::test]
    async fn test_failed_persist_keeps_previous_value() {
        let persistence = Arc::new(MemoryPersistence::default());
        let store = SettingsStore::new(persistence.clone());
        store.initialize().await.unwrap();

        persistence.fail_writes.store(true, Ordering::SeqCst);
        let err = store.set("AUTO_READ", "no").await.unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
        assert_eq!(store.get("AUTO_READ", ""), "yes");

        persistence.fail_writes.store(false, Ordering::SeqCst);
        store.set("CHATBOT", "yes").await.unwrap();
        let on_disk = persistence.snapshot.lock().unwrap().clone().unwrap();
        assert_eq!(on_disk.settings["AUTO_READ"], "yes");
        assert_eq!(on_disk.settings["CHATBOT"], "yes");
    }

    #[tokio::test]
    async fn test_set_rejects_empty_key() {
        let store = SettingsStore::new(Arc::new(MemoryPersistence::default()));
        store.initialize().await.unwrap();
        assert!(matches!(store.set("  ", "x").await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_metadata_preserved_across_writes() {
        let persistence = Arc::new(MemoryPersistence::default());
        let store = SettingsStore::new(persistence.clone());
        store.initialize().await.unwrap();
        let created = persistence.snapshot.lock().unwrap().clone().unwrap().metadata.created;

        store.set("AUTO_BIO", "no").await.unwrap();
        let meta = persistence.snapshot.lock().unwrap().clone().unwrap().metadata;
        assert_eq!(meta.created, created);
        assert_eq!(meta.session_id, store.session_id());
        assert!(meta.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_overrides_apply_only_on_first_run() {
        let dir = TempDir::new().unwrap();
        let overrides = HashMap::from([("CHATBOT".to_string(), "yes".to_string())]);
        let store = SettingsStore::open(dir.path()).with_overrides(overrides);
        store.initialize().await.unwrap();
        assert_eq!(store.get("CHATBOT", ""), "yes");

        store.set("CHATBOT", "no").await.unwrap();
        let overrides = HashMap::from([("CHATBOT".to_string(), "yes".to_string())]);
        let reopened = SettingsStore::open(dir.path()).with_overrides(overrides);
        reopened.initialize().await.unwrap();
        assert_eq!(reopened.get("CHATBOT", ""), "no");
    }

    #[tokio::test]
    async fn test_sync_without_remote_is_noop() {
        let store = SettingsStore::new(Arc::new(MemoryPersistence::default()));
        store.initialize().await.unwrap();
        assert!(!store.has_remote());
        assert_eq!(store.sync_from_remote().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reload_without_snapshot_is_not_found() {
        let store = SettingsStore::new(Arc::new(MemoryPersistence::default()));
        assert!(matches!(store.reload().await, Err(AppError::NotFound(_))));
    }
}
