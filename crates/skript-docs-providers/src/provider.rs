use std::sync::Arc;

use async_trait::async_trait;
use skript_docs_client::{
    types::{DocumentationElement, ProviderId, Query},
    ContractViolation, ProviderError,
};

/// A searchable documentation source.
///
/// Vendor adapters and the combining aggregator all implement this, so callers
/// never branch on which kind of provider they hold.
#[async_trait]
pub trait DocumentationProvider: Send + Sync {
    /// Display name, unique within a registry.
    fn name(&self) -> &str;

    /// Attribution image. `None` when the provider has no single icon.
    fn icon_url(&self) -> Option<&str>;

    fn id(&self) -> ProviderId {
        ProviderId::new(self.name())
    }

    /// Runs one remote lookup. Either every returned element is fully mapped or the call fails.
    async fn search(&self, query: &Query) -> Result<Vec<DocumentationElement>, ProviderError>;

    /// Fills fields the search response leaves out. The default only checks ownership.
    async fn enrich(&self, element: &mut DocumentationElement) -> Result<(), ProviderError> {
        ContractViolation::check(self.name(), &element.provider, &element.id)?;
        Ok(())
    }
}

pub type SharedProvider = Arc<dyn DocumentationProvider>;
