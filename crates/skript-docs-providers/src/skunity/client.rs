use std::{fmt, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use skript_docs_client::{
    build_http_client, fetch_json,
    text::{decode_html_entities, normalize_addon_version},
    types::{DocumentationElement, ProviderId, Query, SyntaxType},
    ProviderError,
};

use super::types::{SkUnityRecord, SkUnitySearchResponse};
use crate::provider::DocumentationProvider;

const NAME: &str = "skUnity";
const ICON_URL: &str = "https://i.imgur.com/Ci6jjhv.png";
const API_URL: &str = "https://docs.skunity.com/api/";
const LINK_BASE: &str = "https://docs.skunity.com/syntax/search/id:";

/// skUnity docs API. Examples arrive inline with search results, so
/// enrichment never needs a second request.
pub struct SkUnityClient {
    http: Client,
    key: String,
    api_url: String,
}

impl fmt::Debug for SkUnityClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkUnityClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl SkUnityClient {
    pub fn new(key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_http_client(timeout)?,
            key: key.into(),
            api_url: API_URL.to_string(),
        })
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn syntax_type(doc: &str) -> Result<SyntaxType, ProviderError> {
        let syntax_type = match doc {
            "effects" => SyntaxType::Effect,
            "conditions" => SyntaxType::Condition,
            "expressions" => SyntaxType::Expression,
            "events" => SyntaxType::Event,
            "types" => SyntaxType::ClassInfo,
            "sections" => SyntaxType::Section,
            "functions" => SyntaxType::Function,
            other => return Err(ProviderError::unknown_category(NAME, other)),
        };
        Ok(syntax_type)
    }

    pub(crate) fn convert(
        provider: &ProviderId,
        record: SkUnityRecord,
    ) -> Result<DocumentationElement, ProviderError> {
        let syntax_type = Self::syntax_type(&record.doc)?;
        let examples = record
            .examples
            .iter()
            .map(|example| decode_html_entities(&example.example).into_owned())
            .collect();
        let link = format!("{LINK_BASE}{}", record.id);
        Ok(DocumentationElement {
            provider: provider.clone(),
            name: record.name,
            description: record.desc.unwrap_or_default(),
            patterns: decode_html_entities(&record.pattern)
                .split('\n')
                .map(str::to_string)
                .collect(),
            examples: Some(examples),
            required_addon: record.addon,
            required_addon_version: normalize_addon_version(record.version.as_deref()),
            required_minecraft_version: None,
            syntax_type,
            required_plugins: (!record.plugin.is_empty()).then_some(record.plugin),
            return_type: record.returntype.filter(|value| !value.is_empty()),
            event_values: record
                .eventvalues
                .filter(|value| !value.is_empty())
                .map(|value| value.split('\n').map(str::to_string).collect()),
            cancellable: None,
            link: Some(link),
            id: record.id,
        })
    }
}

#[async_trait]
impl DocumentationProvider for SkUnityClient {
    fn name(&self) -> &str {
        NAME
    }

    fn icon_url(&self) -> Option<&str> {
        Some(ICON_URL)
    }

    #[instrument(name = "skunity_client.search", skip(self))]
    async fn search(&self, query: &Query) -> Result<Vec<DocumentationElement>, ProviderError> {
        let request = self.http.get(&self.api_url).query(&[
            ("key", self.key.as_str()),
            ("function", "doSearch"),
            ("query", query.as_str()),
        ]);
        let body: SkUnitySearchResponse = fetch_json(NAME, request).await?;
        debug!(
            target: "skript_docs_providers",
            count = body.result.records.len(),
            "skUnity search completed"
        );

        let provider = self.id();
        body.result
            .records
            .into_iter()
            .map(|record| Self::convert(&provider, record))
            .collect()
    }
}
