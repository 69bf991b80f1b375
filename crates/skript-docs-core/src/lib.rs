use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use skript_docs_client::DEFAULT_PROVIDER_TIMEOUT;
use skript_docs_providers::{
    skriptlang::client::CATALOG_TTL, ProviderRegistry, SkUnityClient, SkriptHubClient,
    SkriptLangClient,
};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub mod commands;
pub mod preferences;
pub mod render;
pub mod session;
pub mod state;
pub mod surface;
pub mod text;
pub mod transport;

use preferences::{GuildPreferences, JsonFileConfigStore};
use state::{BotContext, Timeouts, DEFAULT_INTERACTION_TIMEOUT};

/// Inputs required to bootstrap the bot core.
#[derive(Clone)]
pub struct CoreConfig {
    /// Skript Hub API token. Skript Hub is only registered when present.
    pub skripthub_token: Option<String>,
    /// skUnity API key. skUnity is only registered when present.
    pub skunity_key: Option<String>,
    pub skriptlang_enabled: bool,
    /// JSON document holding guild preferences.
    pub data_file: PathBuf,
    pub provider_timeout: Duration,
    pub interaction_timeout: Duration,
    /// Freshness window of the downloaded SkriptLang catalog.
    pub catalog_ttl: Duration,
    /// Timestamp captured during process initialization for diagnostics.
    pub boot_timestamp: OffsetDateTime,
    pub mode: ServerMode,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("skripthub", &self.skripthub_token.is_some())
            .field("skunity", &self.skunity_key.is_some())
            .field("skriptlang", &self.skriptlang_enabled)
            .field("data_file", &self.data_file)
            .field("provider_timeout", &self.provider_timeout)
            .field("interaction_timeout", &self.interaction_timeout)
            .field("catalog_ttl", &self.catalog_ttl)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    Stdio,
    Headless,
}

impl CoreConfig {
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self {
            skripthub_token: None,
            skunity_key: None,
            skriptlang_enabled: true,
            data_file: data_file.into(),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            interaction_timeout: DEFAULT_INTERACTION_TIMEOUT,
            catalog_ttl: CATALOG_TTL,
            boot_timestamp: OffsetDateTime::now_utc(),
            mode: ServerMode::Stdio,
        }
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            provider: self.provider_timeout,
            interaction: self.interaction_timeout,
        }
    }
}

#[derive(Clone)]
pub struct CoreRuntime {
    config: CoreConfig,
    context: Arc<BotContext>,
}

impl CoreRuntime {
    pub fn context(&self) -> Arc<BotContext> {
        self.context.clone()
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub async fn serve(&self, shutdown: CancellationToken) -> Result<()> {
        match self.config.mode {
            ServerMode::Stdio => transport::serve_stdio(self.context.clone(), shutdown).await?,
            ServerMode::Headless => {
                debug!(target: "skript_docs_core", "Headless mode: skipping transport loop");
            }
        }
        Ok(())
    }
}

/// Registers the configured documentation sources in their fixed order:
/// Skript Hub, skUnity, SkriptLang.
pub fn build_registry(config: &CoreConfig) -> Result<ProviderRegistry> {
    let timeout = config.provider_timeout;
    let mut registry = ProviderRegistry::new();

    match &config.skripthub_token {
        Some(token) => registry.register(
            "skripthub",
            Arc::new(SkriptHubClient::new(token.clone(), timeout)?),
        )?,
        None => warn!(target: "skript_docs_core", "no Skript Hub token configured, source disabled"),
    }
    match &config.skunity_key {
        Some(key) => {
            registry.register("skunity", Arc::new(SkUnityClient::new(key.clone(), timeout)?))?;
        }
        None => warn!(target: "skript_docs_core", "no skUnity key configured, source disabled"),
    }
    if config.skriptlang_enabled {
        let client = SkriptLangClient::new(timeout)?.with_ttl(config.catalog_ttl);
        registry.register("skriptlang", Arc::new(client))?;
    }

    if registry.is_empty() {
        warn!(target: "skript_docs_core", "no documentation sources are configured");
    }
    Ok(registry)
}

pub async fn bootstrap(config: CoreConfig) -> Result<CoreRuntime> {
    let registry = build_registry(&config)?;
    let store = JsonFileConfigStore::open(&config.data_file)
        .await
        .with_context(|| format!("failed to open preference store {:?}", config.data_file))?;
    let preferences = GuildPreferences::new(Arc::new(store), registry);
    let context = Arc::new(BotContext::new(preferences, config.timeouts()));

    info!(
        target: "skript_docs_core",
        sources = ?context.registry.keys().collect::<Vec<_>>(),
        data_file = %config.data_file.display(),
        boot_timestamp = %config.boot_timestamp,
        mode = ?config.mode,
        "Core starting"
    );

    Ok(CoreRuntime { config, context })
}

pub async fn run(config: CoreConfig, shutdown: CancellationToken) -> Result<()> {
    bootstrap(config).await?.serve(shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn headless_bootstrap_completes() {
        let tmp = tempdir().expect("tempdir");
        let mut config = CoreConfig::new(tmp.path().join("data.json"));
        config.mode = ServerMode::Headless;

        let runtime = bootstrap(config).await.expect("bootstrap succeeds");

        assert_eq!(runtime.context().registry.keys().collect::<Vec<_>>(), vec!["skriptlang"]);
        assert!(runtime.serve(CancellationToken::new()).await.is_ok());
    }

    #[test]
    fn registry_follows_fixed_order() {
        let mut config = CoreConfig::new("unused.json");
        config.skripthub_token = Some("token".to_string());
        config.skunity_key = Some("key".to_string());

        let registry = build_registry(&config).unwrap();

        assert_eq!(
            registry.keys().collect::<Vec<_>>(),
            vec!["skripthub", "skunity", "skriptlang"]
        );
    }

    #[test]
    fn disabled_sources_are_not_registered() {
        let mut config = CoreConfig::new("unused.json");
        config.skunity_key = Some("key".to_string());
        config.skriptlang_enabled = false;

        let registry = build_registry(&config).unwrap();

        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["skunity"]);
    }
}
