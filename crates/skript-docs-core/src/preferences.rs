use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use skript_docs_client::types::{GuildConfig, GuildId};
use skript_docs_providers::{ProviderRegistry, SharedProvider};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::{fs, sync::Mutex, task};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read preference file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write preference file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("preference file {path:?} is not valid: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode preferences: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("preference task panicked: {0}")]
    Join(#[from] task::JoinError),
}

/// Keyed get/upsert over per-guild configuration.
#[async_trait]
pub trait GuildConfigStore: Send + Sync {
    /// Stored config for `guild`, or the all-`None` default when there is none.
    async fn get(&self, guild: GuildId) -> Result<GuildConfig, StoreError>;
    /// Replaces whatever is stored for `guild`.
    async fn set(&self, guild: GuildId, config: GuildConfig) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(default)]
    configurations: Vec<ConfigurationRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigurationRecord {
    guild_id: GuildId,
    config: GuildConfig,
    updated_at: OffsetDateTime,
}

/// Preference store backed by one JSON document with a `configurations` collection.
///
/// The whole document is held in memory and rewritten on every upsert through a
/// temporary file and a rename, so a crash never leaves a half-written file.
#[derive(Debug)]
pub struct JsonFileConfigStore {
    path: PathBuf,
    records: Mutex<BTreeMap<GuildId, ConfigurationRecord>>,
}

impl JsonFileConfigStore {
    /// Loads `path`, treating a missing or empty file as an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = load_records(&path).await?;
        info!(
            target: "skript_docs_store",
            path = %path.display(),
            guilds = records.len(),
            "preference store opened"
        );
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored guild with its config, in guild id order.
    pub async fn entries(&self) -> Vec<(GuildId, GuildConfig)> {
        self.records
            .lock()
            .await
            .values()
            .map(|record| (record.guild_id, record.config.clone()))
            .collect()
    }

    async fn persist(&self, records: &BTreeMap<GuildId, ConfigurationRecord>) -> Result<(), StoreError> {
        let document = PreferenceFile {
            configurations: records.values().cloned().collect(),
        };
        let payload = task::spawn_blocking(move || serde_json::to_vec_pretty(&document))
            .await?
            .map_err(StoreError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, payload)
            .await
            .map_err(|source| StoreError::Write {
                path: staging.clone(),
                source,
            })?;
        fs::rename(&staging, &self.path)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        debug!(target: "skript_docs_store", path = %self.path.display(), "preferences written");
        Ok(())
    }
}

async fn load_records(path: &Path) -> Result<BTreeMap<GuildId, ConfigurationRecord>, StoreError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(BTreeMap::new());
    }

    let owned = path.to_path_buf();
    let document = task::spawn_blocking(move || serde_json::from_slice::<PreferenceFile>(&bytes))
        .await?
        .map_err(|source| StoreError::Corrupt { path: owned, source })?;

    // Later records win, matching upsert semantics if the file was edited by hand.
    Ok(document
        .configurations
        .into_iter()
        .map(|record| (record.guild_id, record))
        .collect())
}

#[async_trait]
impl GuildConfigStore for JsonFileConfigStore {
    async fn get(&self, guild: GuildId) -> Result<GuildConfig, StoreError> {
        Ok(self
            .records
            .lock()
            .await
            .get(&guild)
            .map(|record| record.config.clone())
            .unwrap_or_default())
    }

    async fn set(&self, guild: GuildId, config: GuildConfig) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        let previous = records.insert(
            guild,
            ConfigurationRecord {
                guild_id: guild,
                config,
                updated_at: OffsetDateTime::now_utc(),
            },
        );
        if let Err(error) = self.persist(&records).await {
            match previous {
                Some(previous) => records.insert(guild, previous),
                None => records.remove(&guild),
            };
            return Err(error);
        }
        debug!(target: "skript_docs_store", guild = %guild, "guild config saved");
        Ok(())
    }
}

/// Volatile store for tests and offline runs.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    configs: DashMap<GuildId, GuildConfig>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GuildConfigStore for MemoryConfigStore {
    async fn get(&self, guild: GuildId) -> Result<GuildConfig, StoreError> {
        Ok(self
            .configs
            .get(&guild)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn set(&self, guild: GuildId, config: GuildConfig) -> Result<(), StoreError> {
        self.configs.insert(guild, config);
        Ok(())
    }
}

/// Result of parsing a `set-sources` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcesUpdate {
    Reset,
    Updated(Vec<String>),
    UnknownSource(String),
}

/// Guild preferences interpreted against the registered providers.
///
/// Writes to one guild are serialized so concurrent commands never lose an update.
#[derive(Clone)]
pub struct GuildPreferences {
    store: Arc<dyn GuildConfigStore>,
    registry: ProviderRegistry,
    write_locks: Arc<DashMap<GuildId, Arc<Mutex<()>>>>,
}

impl GuildPreferences {
    pub fn new(store: Arc<dyn GuildConfigStore>, registry: ProviderRegistry) -> Self {
        Self {
            store,
            registry,
            write_locks: Arc::new(DashMap::new()),
        }
    }

    fn write_lock(&self, guild: GuildId) -> Arc<Mutex<()>> {
        self.write_locks.entry(guild).or_default().value().clone()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub async fn config(&self, guild: GuildId) -> Result<GuildConfig, StoreError> {
        self.store.get(guild).await
    }

    /// Providers a search in `guild` starts with.
    ///
    /// Preferred keys are used in their stored order. Keys that no longer name a
    /// registered provider are skipped; if none are left every provider is used.
    pub fn active_providers(&self, config: &GuildConfig) -> Vec<SharedProvider> {
        let Some(preferred) = &config.preferred_providers else {
            return self.registry.providers();
        };
        let selected = self.registry.select(preferred);
        if selected.is_empty() {
            warn!(
                target: "skript_docs_store",
                preferred = ?preferred,
                "no preferred source is registered, using all sources"
            );
            return self.registry.providers();
        }
        selected
    }

    /// Applies a comma separated `set-sources` argument. `default` clears the preference.
    ///
    /// Nothing is saved when any key is unknown.
    pub async fn set_sources(&self, guild: GuildId, raw: &str) -> Result<SourcesUpdate, StoreError> {
        let lock = self.write_lock(guild);
        let _guard = lock.lock().await;
        let mut config = self.store.get(guild).await?;
        if raw.trim().eq_ignore_ascii_case("default") {
            config.preferred_providers = None;
            self.store.set(guild, config).await?;
            return Ok(SourcesUpdate::Reset);
        }

        let mut keys = Vec::new();
        for source in raw.split(',') {
            let key = source.trim().to_lowercase();
            if !self.registry.contains_key(&key) {
                return Ok(SourcesUpdate::UnknownSource(key));
            }
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        config.preferred_providers = Some(keys.clone());
        self.store.set(guild, config).await?;
        Ok(SourcesUpdate::Updated(keys))
    }

    pub async fn set_enforced(&self, guild: GuildId, enforced: bool) -> Result<(), StoreError> {
        let lock = self.write_lock(guild);
        let _guard = lock.lock().await;
        let mut config = self.store.get(guild).await?;
        config.enforce_preferred_providers = Some(enforced);
        self.store.set(guild, config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn unknown_guild_gets_default_config() {
        let dir = tempdir().expect("tempdir");
        let store = JsonFileConfigStore::open(dir.path().join("data.json"))
            .await
            .unwrap();

        let config = store.get(GuildId(7)).await.unwrap();

        assert_eq!(config.preferred_providers, None);
        assert_eq!(config.enforce_preferred_providers, None);
    }

    #[tokio::test]
    async fn configs_survive_reopening() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("data.json");
        let store = JsonFileConfigStore::open(&path).await.unwrap();
        let config = GuildConfig {
            preferred_providers: Some(vec!["skunity".to_string(), "skripthub".to_string()]),
            enforce_preferred_providers: Some(true),
        };
        store.set(GuildId(1), config.clone()).await.unwrap();
        store.set(GuildId(2), GuildConfig::default()).await.unwrap();
        drop(store);

        let reopened = JsonFileConfigStore::open(&path).await.unwrap();

        assert_eq!(reopened.get(GuildId(1)).await.unwrap(), config);
        assert_eq!(reopened.entries().await.len(), 2);
        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["configurations"][0]["guild_id"], 1);
        assert_eq!(raw["configurations"][0]["config"]["preferred_providers"][0], "skunity");
    }

    #[tokio::test]
    async fn upsert_overwrites_previous_record() {
        let store = MemoryConfigStore::new();
        store
            .set(
                GuildId(3),
                GuildConfig {
                    preferred_providers: Some(vec!["skunity".to_string()]),
                    enforce_preferred_providers: None,
                },
            )
            .await
            .unwrap();
        store.set(GuildId(3), GuildConfig::default()).await.unwrap();

        assert_eq!(store.get(GuildId(3)).await.unwrap(), GuildConfig::default());
    }

    /// Store whose reads yield long enough for concurrent writers to interleave.
    #[derive(Default)]
    struct SlowReadStore {
        inner: MemoryConfigStore,
    }

    #[async_trait]
    impl GuildConfigStore for SlowReadStore {
        async fn get(&self, guild: GuildId) -> Result<GuildConfig, StoreError> {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            self.inner.get(guild).await
        }

        async fn set(&self, guild: GuildId, config: GuildConfig) -> Result<(), StoreError> {
            self.inner.set(guild, config).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_updates_to_one_guild_are_both_kept() {
        let mut registry = ProviderRegistry::new();
        let client = skript_docs_providers::SkUnityClient::new("key", std::time::Duration::from_secs(1))
            .unwrap();
        registry.register("skunity", Arc::new(client)).unwrap();
        let preferences = GuildPreferences::new(Arc::new(SlowReadStore::default()), registry);

        let (sources, enforced) = tokio::join!(
            preferences.set_sources(GuildId(9), "skunity"),
            preferences.set_enforced(GuildId(9), true),
        );
        sources.unwrap();
        enforced.unwrap();

        let config = preferences.config(GuildId(9)).await.unwrap();
        assert_eq!(config.preferred_providers, Some(vec!["skunity".to_string()]));
        assert_eq!(config.enforce_preferred_providers, Some(true));
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("data.json");
        std::fs::write(&path, b"{not json").unwrap();

        let error = JsonFileConfigStore::open(&path).await.expect_err("corrupt");

        assert!(matches!(error, StoreError::Corrupt { .. }));
    }
}
