pub mod cache;
pub mod error;
pub mod text;
pub mod types;

pub use cache::TimedCatalog;
pub use error::{ContractViolation, ProviderError};

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub const USER_AGENT: &str = "SkriptDocsBot/1.0";

/// Default bound on any single remote documentation call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the HTTP client shared by every adapter. `timeout` bounds each request end to end.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .gzip(true)
        .build()
        .context("failed to build reqwest client")
}

/// Sends `request` and decodes a JSON body, attributing every failure to `provider`.
pub async fn fetch_json<T>(provider: &str, request: RequestBuilder) -> Result<T, ProviderError>
where
    T: DeserializeOwned,
{
    let response = request.send().await.map_err(|source| ProviderError::Http {
        provider: provider.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        warn!(
            target: "skript_docs_client",
            provider,
            status = %status,
            url = %response.url(),
            "documentation request failed"
        );
        return Err(ProviderError::Status {
            provider: provider.to_string(),
            status,
        });
    }

    let bytes = response.bytes().await.map_err(|source| ProviderError::Http {
        provider: provider.to_string(),
        source,
    })?;
    debug!(target: "skript_docs_client", provider, bytes = bytes.len(), "response received");

    serde_json::from_slice(&bytes).map_err(|source| ProviderError::Decode {
        provider: provider.to_string(),
        source,
    })
}
