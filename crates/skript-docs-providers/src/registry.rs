use skript_docs_client::types::ProviderId;
use thiserror::Error;
use tracing::warn;

use crate::provider::SharedProvider;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a provider is already registered under key `{0}`")]
    DuplicateKey(String),
    #[error("a provider named `{0}` is already registered")]
    DuplicateName(String),
}

/// Registered providers in registration order, addressable by config key
/// (`skripthub`) or by the display name elements point back to.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    entries: Vec<(String, SharedProvider)>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider under a lower-case key. Keys and names must both be unique.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        provider: SharedProvider,
    ) -> Result<(), RegistryError> {
        let key = key.into().to_lowercase();
        if self.entries.iter().any(|(existing, _)| *existing == key) {
            return Err(RegistryError::DuplicateKey(key));
        }
        if self.entries.iter().any(|(_, p)| p.name() == provider.name()) {
            return Err(RegistryError::DuplicateName(provider.name().to_string()));
        }
        self.entries.push((key, provider));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<SharedProvider> {
        let key = key.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, provider)| provider.clone())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Resolves an element's back-reference.
    pub fn resolve(&self, id: &ProviderId) -> Option<SharedProvider> {
        self.entries
            .iter()
            .find(|(_, provider)| provider.name() == id.as_str())
            .map(|(_, provider)| provider.clone())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn providers(&self) -> Vec<SharedProvider> {
        self.entries.iter().map(|(_, provider)| provider.clone()).collect()
    }

    /// Providers for `keys` in the order given. Unknown keys are skipped and
    /// each provider appears once, at its first position.
    pub fn select<S: AsRef<str>>(&self, keys: &[S]) -> Vec<SharedProvider> {
        let mut selected: Vec<SharedProvider> = Vec::new();
        for key in keys {
            let Some(provider) = self.get(key.as_ref()) else {
                warn!(
                    target: "skript_docs_providers",
                    key = key.as_ref(),
                    "ignoring unknown provider key"
                );
                continue;
            };
            if !selected.iter().any(|existing| existing.name() == provider.name()) {
                selected.push(provider);
            }
        }
        selected
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
