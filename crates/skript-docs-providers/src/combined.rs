use std::{collections::HashSet, fmt, time::Duration};

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, error, instrument};

use skript_docs_client::{
    types::{DocumentationElement, Query},
    ContractViolation, ProviderError, DEFAULT_PROVIDER_TIMEOUT,
};

use crate::provider::{DocumentationProvider, SharedProvider};

/// Size of a result picker. One slot is kept free for the "no results" placeholder.
pub const MAX_SELECT_OPTION_COUNT: usize = 25;

/// Fans a query out to several providers and merges their answers.
///
/// Providers are queried concurrently but merged in the order given here,
/// which decides both deduplication winners and result order. A failing or
/// slow provider contributes nothing and never fails the search.
#[derive(Clone)]
pub struct CombinedDocumentationProvider {
    providers: Vec<SharedProvider>,
    name: String,
    timeout: Duration,
}

impl fmt::Debug for CombinedDocumentationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedDocumentationProvider")
            .field("providers", &self.provider_names())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CombinedDocumentationProvider {
    pub fn new(providers: impl IntoIterator<Item = SharedProvider>) -> Self {
        let providers: Vec<SharedProvider> = providers.into_iter().collect();
        let name = format!(
            "CombinedDocumentationProvider({:?})",
            providers.iter().map(|p| p.name()).collect::<Vec<_>>()
        );
        Self {
            providers,
            name,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Bounds each constituent call. Expiry counts as that provider failing.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn providers(&self) -> &[SharedProvider] {
        &self.providers
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|provider| provider.name()).collect()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn search_one(&self, provider: &SharedProvider, query: &Query) -> Vec<DocumentationElement> {
        let outcome = match tokio::time::timeout(self.timeout, provider.search(query)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProviderError::Timeout {
                provider: provider.name().to_string(),
                timeout: self.timeout,
            }),
        };

        match outcome {
            Ok(elements) => {
                debug!(
                    target: "skript_docs_providers",
                    provider = provider.name(),
                    count = elements.len(),
                    "provider returned results"
                );
                elements
            }
            Err(error) => {
                error!(
                    target: "skript_docs_providers",
                    provider = provider.name(),
                    error = %error,
                    "provider failed to provide results"
                );
                Vec::new()
            }
        }
    }
}

/// Merges per-provider batches in order, keeping the first element for each detailed name.
///
/// Stops taking new batches once the picker is full and returns at most
/// `MAX_SELECT_OPTION_COUNT - 1` elements.
#[must_use]
pub fn merge_results(batches: Vec<Vec<DocumentationElement>>) -> Vec<DocumentationElement> {
    let mut seen = HashSet::new();
    let mut elements = Vec::new();
    for batch in batches {
        if elements.len() >= MAX_SELECT_OPTION_COUNT {
            break;
        }
        for element in batch {
            if seen.insert(element.detailed_name()) {
                elements.push(element);
            }
        }
    }
    elements.truncate(MAX_SELECT_OPTION_COUNT - 1);
    elements
}

#[async_trait]
impl DocumentationProvider for CombinedDocumentationProvider {
    fn name(&self) -> &str {
        &self.name
    }

    /// A combination has no single icon.
    fn icon_url(&self) -> Option<&str> {
        None
    }

    #[instrument(name = "combined_provider.search", skip(self), fields(providers = ?self.provider_names()))]
    async fn search(&self, query: &Query) -> Result<Vec<DocumentationElement>, ProviderError> {
        let batches = join_all(
            self.providers
                .iter()
                .map(|provider| self.search_one(provider, query)),
        )
        .await;
        Ok(merge_results(batches))
    }

    /// Delegates to the constituent that produced `element`.
    async fn enrich(&self, element: &mut DocumentationElement) -> Result<(), ProviderError> {
        let owner = self
            .providers
            .iter()
            .find(|provider| provider.name() == element.provider.as_str())
            .ok_or_else(|| ContractViolation {
                element: element.id.clone(),
                expected: self.name.clone(),
                actual: element.provider.to_string(),
            })?;
        owner.enrich(element).await
    }
}
