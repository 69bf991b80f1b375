use std::{fmt, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use skript_docs_client::{
    build_http_client, fetch_json,
    text::{decode_html_entities, normalize_addon_version},
    types::{DocumentationElement, ProviderId, Query, SyntaxType},
    ContractViolation, ProviderError,
};

use super::types::{plugin_names, split_event_values, SkriptHubExample, SkriptHubSyntax};
use crate::provider::DocumentationProvider;

const NAME: &str = "Skript Hub";
const ICON_URL: &str = "https://i.imgur.com/YkzJ97l.png";
const BASE_URL: &str = "https://skripthub.net/api/v1";

/// Skript Hub REST API. Search results carry no examples; they are fetched on enrichment.
pub struct SkriptHubClient {
    http: Client,
    token: String,
    base_url: String,
}

impl fmt::Debug for SkriptHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkriptHubClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SkriptHubClient {
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_http_client(timeout)?,
            token: token.into(),
            base_url: BASE_URL.to_string(),
        })
    }

    /// Points the client at another API root, e.g. a mirror.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn authorization(&self) -> String {
        format!("Token {}", self.token)
    }

    fn syntax_type(raw: &str) -> Result<SyntaxType, ProviderError> {
        let syntax_type = match raw.to_ascii_lowercase().as_str() {
            "effect" => SyntaxType::Effect,
            "condition" => SyntaxType::Condition,
            "expression" => SyntaxType::Expression,
            "section" => SyntaxType::Section,
            "function" => SyntaxType::Function,
            "event" => SyntaxType::Event,
            "type" | "classinfo" => SyntaxType::ClassInfo,
            _ => return Err(ProviderError::unknown_category(NAME, raw)),
        };
        Ok(syntax_type)
    }

    pub(crate) fn convert(
        provider: &ProviderId,
        row: SkriptHubSyntax,
    ) -> Result<DocumentationElement, ProviderError> {
        let syntax_type = Self::syntax_type(&row.syntax_type)?;
        let plugins = plugin_names(&row.required_plugins);
        Ok(DocumentationElement {
            id: row.id,
            provider: provider.clone(),
            name: row.title,
            description: row.description.unwrap_or_default(),
            patterns: decode_html_entities(&row.syntax_pattern)
                .split('\n')
                .map(str::to_string)
                .collect(),
            examples: None,
            required_addon: row.addon,
            required_addon_version: normalize_addon_version(
                row.compatible_addon_version.as_deref(),
            ),
            required_minecraft_version: row.compatible_minecraft_version,
            syntax_type,
            required_plugins: (!plugins.is_empty()).then_some(plugins),
            return_type: row.return_type,
            event_values: row.event_values.as_deref().map(split_event_values),
            cancellable: row.event_cancellable,
            link: row.link,
        })
    }
}

#[async_trait]
impl DocumentationProvider for SkriptHubClient {
    fn name(&self) -> &str {
        NAME
    }

    fn icon_url(&self) -> Option<&str> {
        Some(ICON_URL)
    }

    #[instrument(name = "skripthub_client.search", skip(self))]
    async fn search(&self, query: &Query) -> Result<Vec<DocumentationElement>, ProviderError> {
        let request = self
            .http
            .get(format!("{}/syntax/", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .query(&[("search", query.as_str())]);
        let rows: Vec<SkriptHubSyntax> = fetch_json(NAME, request).await?;
        debug!(target: "skript_docs_providers", count = rows.len(), "Skript Hub search completed");

        let provider = self.id();
        rows.into_iter()
            .map(|row| Self::convert(&provider, row))
            .collect()
    }

    #[instrument(name = "skripthub_client.enrich", skip(self, element), fields(id = %element.id))]
    async fn enrich(&self, element: &mut DocumentationElement) -> Result<(), ProviderError> {
        ContractViolation::check(NAME, &element.provider, &element.id)?;
        if element.examples_fetched() {
            return Ok(());
        }

        let request = self
            .http
            .get(format!("{}/syntaxexample/", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .query(&[("syntax", element.id.as_str())]);
        let examples: Vec<SkriptHubExample> = fetch_json(NAME, request).await?;
        element.examples = Some(
            examples
                .into_iter()
                .map(|example| decode_html_entities(&example.example_code).into_owned())
                .collect(),
        );
        Ok(())
    }
}
