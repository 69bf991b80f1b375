use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::types::ProviderId;

/// Failure of a single documentation source. Always carries the provider name.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider}: HTTP request failed: {source}")]
    Http {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider}: unexpected status code: {status}")]
    Status { provider: String, status: StatusCode },
    #[error("{provider}: failed to decode response: {source}")]
    Decode {
        provider: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{provider}: unrecognized syntax category `{category}`")]
    UnknownCategory { provider: String, category: String },
    #[error("{provider}: no response within {timeout:?}")]
    Timeout { provider: String, timeout: Duration },
    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

impl ProviderError {
    pub fn unknown_category(provider: &str, category: impl Into<String>) -> Self {
        Self::UnknownCategory {
            provider: provider.to_string(),
            category: category.into(),
        }
    }

    /// Name of the provider that failed.
    #[must_use]
    pub fn provider(&self) -> &str {
        match self {
            Self::Http { provider, .. }
            | Self::Status { provider, .. }
            | Self::Decode { provider, .. }
            | Self::UnknownCategory { provider, .. }
            | Self::Timeout { provider, .. } => provider,
            Self::Contract(violation) => &violation.expected,
        }
    }
}

/// An element was handed to a provider other than the one that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("element `{element}` was provided by {actual}, but must be provided by {expected}")]
pub struct ContractViolation {
    pub element: String,
    pub expected: String,
    pub actual: String,
}

impl ContractViolation {
    /// Returns an error unless `owner` is the provider named `expected`.
    pub fn check(expected: &str, owner: &ProviderId, element_id: &str) -> Result<(), Self> {
        if owner.as_str() == expected {
            return Ok(());
        }
        Err(Self {
            element: element_id.to_string(),
            expected: expected.to_string(),
            actual: owner.to_string(),
        })
    }
}
