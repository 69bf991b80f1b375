use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, Map};
use directories::ProjectDirs;
use serde::Deserialize;
use skript_docs_core::{CoreConfig, ServerMode};

pub const ENV_PREFIX: &str = "SKRIPT";
const DATA_FILE_NAME: &str = "data.json";

/// Bot settings merged from an optional config file and `SKRIPT_*` variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub skripthub_token: Option<String>,
    pub skunity_key: Option<String>,
    pub skriptlang_enabled: bool,
    pub data_file: Option<PathBuf>,
    pub provider_timeout_secs: u64,
    pub interaction_timeout_secs: u64,
    pub catalog_ttl_secs: u64,
    pub headless: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let defaults = CoreConfig::new(PathBuf::new());
        Self {
            skripthub_token: None,
            skunity_key: None,
            skriptlang_enabled: true,
            data_file: None,
            provider_timeout_secs: defaults.provider_timeout.as_secs(),
            interaction_timeout_secs: defaults.interaction_timeout.as_secs(),
            catalog_ttl_secs: defaults.catalog_ttl.as_secs(),
            headless: false,
        }
    }
}

impl Settings {
    /// Loads settings from `path` (when given) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`Settings::load`] but reads variables from `env` instead of the process.
    pub fn load_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        );

        let settings: Self = builder
            .build()
            .context("failed to read bot settings")?
            .try_deserialize()
            .context("invalid bot settings")?;
        Ok(settings)
    }

    pub fn data_file(&self) -> Result<PathBuf> {
        match &self.data_file {
            Some(path) => Ok(path.clone()),
            None => default_data_file(),
        }
    }

    pub fn into_core_config(self) -> Result<CoreConfig> {
        let mut config = CoreConfig::new(self.data_file()?);
        config.skripthub_token = self.skripthub_token.filter(|token| !token.is_empty());
        config.skunity_key = self.skunity_key.filter(|key| !key.is_empty());
        config.skriptlang_enabled = self.skriptlang_enabled;
        config.provider_timeout = Duration::from_secs(self.provider_timeout_secs);
        config.interaction_timeout = Duration::from_secs(self.interaction_timeout_secs);
        config.catalog_ttl = Duration::from_secs(self.catalog_ttl_secs);
        config.mode = if self.headless {
            ServerMode::Headless
        } else {
            ServerMode::Stdio
        };
        Ok(config)
    }
}

/// `data.json` inside the platform data directory.
pub fn default_data_file() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("org", "SkriptDocs", "skript-docs-bot")
        .context("unable to resolve project directories")?;
    Ok(dirs.data_dir().join(DATA_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
                .collect(),
        )
    }

    #[test]
    fn defaults_apply_without_sources() {
        let settings = Settings::load_with_env(None, env(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.interaction_timeout_secs, 300);
        assert_eq!(settings.provider_timeout_secs, 10);
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.toml");
        fs::write(
            &path,
            "skripthub_token = \"from-file\"\nskriptlang_enabled = false\ninteraction_timeout_secs = 60\n",
        )
        .unwrap();

        let settings = Settings::load_with_env(
            Some(&path),
            env(&[
                ("SKRIPT_SKRIPTHUB_TOKEN", "from-env"),
                ("SKRIPT_HEADLESS", "true"),
                ("SKRIPT_DATA_FILE", "/var/lib/skript/data.json"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.skripthub_token.as_deref(), Some("from-env"));
        assert!(!settings.skriptlang_enabled);
        assert_eq!(settings.interaction_timeout_secs, 60);

        let config = settings.into_core_config().unwrap();
        assert_eq!(config.mode, ServerMode::Headless);
        assert_eq!(config.data_file, PathBuf::from("/var/lib/skript/data.json"));
        assert_eq!(config.interaction_timeout, Duration::from_secs(60));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Settings::load_with_env(Some(&dir.path().join("absent.toml")), env(&[]));
        assert!(result.is_err());
    }

    #[test]
    fn blank_credentials_disable_sources() {
        let settings = Settings {
            skripthub_token: Some(String::new()),
            data_file: Some(PathBuf::from("data.json")),
            ..Settings::default()
        };
        let config = settings.into_core_config().unwrap();
        assert!(config.skripthub_token.is_none());
    }
}
