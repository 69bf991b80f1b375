pub mod combined;
mod de;
pub mod provider;
pub mod registry;
pub mod skripthub;
pub mod skriptlang;
pub mod skunity;

pub use combined::{merge_results, CombinedDocumentationProvider, MAX_SELECT_OPTION_COUNT};
pub use provider::{DocumentationProvider, SharedProvider};
pub use registry::{ProviderRegistry, RegistryError};
pub use skripthub::SkriptHubClient;
pub use skriptlang::SkriptLangClient;
pub use skunity::SkUnityClient;

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;

    #[test]
    fn registry_rejects_duplicate_keys_and_names() {
        let timeout = Duration::from_secs(1);
        let mut registry = ProviderRegistry::new();
        registry
            .register("skunity", Arc::new(SkUnityClient::new("key", timeout).unwrap()))
            .unwrap();

        let duplicate_key =
            registry.register("SKUNITY", Arc::new(SkriptLangClient::new(timeout).unwrap()));
        assert_eq!(duplicate_key, Err(RegistryError::DuplicateKey("skunity".to_string())));

        let duplicate_name =
            registry.register("other", Arc::new(SkUnityClient::new("key", timeout).unwrap()));
        assert_eq!(duplicate_name, Err(RegistryError::DuplicateName("skUnity".to_string())));
    }

    #[test]
    fn registry_selects_in_requested_order() {
        let timeout = Duration::from_secs(1);
        let mut registry = ProviderRegistry::new();
        registry
            .register("skunity", Arc::new(SkUnityClient::new("key", timeout).unwrap()))
            .unwrap();
        registry
            .register("skriptlang", Arc::new(SkriptLangClient::new(timeout).unwrap()))
            .unwrap();

        let names: Vec<String> = registry
            .select(&["skriptlang", "missing", "skunity"])
            .iter()
            .map(|provider| provider.name().to_string())
            .collect();
        assert_eq!(names, vec!["SkriptLang", "skUnity"]);
        assert_eq!(registry.select(&["skunity", "SKUNITY", "skunity"]).len(), 1);
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["skunity", "skriptlang"]);
        assert!(registry.resolve(&skript_docs_client::types::ProviderId::new("skUnity")).is_some());
    }
}
