use std::{fmt, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use skript_docs_client::{
    build_http_client, fetch_json,
    text::{decode_html_entities, normalize_addon_version},
    types::{DocumentationElement, ProviderId, Query},
    ProviderError, TimedCatalog,
};

use super::types::{Category, SkriptLangSyntax};
use crate::provider::DocumentationProvider;

const NAME: &str = "SkriptLang";
const ICON_URL: &str = "https://docs.skriptlang.org/assets/icon.png";
const SITE_URL: &str = "https://docs.skriptlang.org";
const CATALOG_PATH: &str = "docs.json";
const ADDON: &str = "Skript";

/// How long a downloaded catalog is served before the next search refetches it.
pub const CATALOG_TTL: Duration = Duration::from_secs(60 * 60);

/// Official Skript documentation site.
///
/// The site has no search endpoint, only a full `docs.json` export. The
/// export is downloaded once per [`CATALOG_TTL`] and searched locally.
pub struct SkriptLangClient {
    http: Client,
    site_url: String,
    catalog: TimedCatalog<Vec<DocumentationElement>>,
}

impl fmt::Debug for SkriptLangClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkriptLangClient")
            .field("site_url", &self.site_url)
            .field("ttl", &self.catalog.ttl())
            .finish_non_exhaustive()
    }
}

impl SkriptLangClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_http_client(timeout)?,
            site_url: SITE_URL.to_string(),
            catalog: TimedCatalog::new(CATALOG_TTL),
        })
    }

    #[must_use]
    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = site_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.catalog = TimedCatalog::new(ttl);
        self
    }

    async fn fetch_catalog(&self) -> Result<Vec<DocumentationElement>, ProviderError> {
        let url = format!("{}/{CATALOG_PATH}", self.site_url);
        info!(target: "skript_docs_providers", url = %url, "downloading SkriptLang catalog");
        let document: Map<String, Value> = fetch_json(NAME, self.http.get(&url)).await?;
        let catalog = build_catalog(&self.id(), &self.site_url, document)?;
        debug!(target: "skript_docs_providers", count = catalog.len(), "SkriptLang catalog parsed");
        Ok(catalog)
    }
}

/// Maps every category array of the export. Non-array keys (version info) are skipped;
/// an array under an unknown key fails the whole catalog.
pub(crate) fn build_catalog(
    provider: &ProviderId,
    site_url: &str,
    document: Map<String, Value>,
) -> Result<Vec<DocumentationElement>, ProviderError> {
    let mut elements = Vec::new();
    for (key, value) in document {
        let Value::Array(entries) = value else {
            continue;
        };
        let category =
            Category::from_key(&key).ok_or_else(|| ProviderError::unknown_category(NAME, &key))?;
        for entry in entries {
            let syntax: SkriptLangSyntax =
                serde_json::from_value(entry).map_err(|source| ProviderError::Decode {
                    provider: NAME.to_string(),
                    source,
                })?;
            elements.push(convert(provider, site_url, category, syntax));
        }
    }
    Ok(elements)
}

fn convert(
    provider: &ProviderId,
    site_url: &str,
    category: Category,
    syntax: SkriptLangSyntax,
) -> DocumentationElement {
    let examples = if syntax.examples.is_empty() {
        Vec::new()
    } else {
        vec![decode_html_entities(&syntax.examples.join("\n")).into_owned()]
    };
    DocumentationElement {
        link: Some(format!("{site_url}/{}.html#{}", category.page, syntax.id)),
        id: syntax.id,
        provider: provider.clone(),
        name: syntax.name,
        description: syntax.description.join("\n"),
        patterns: syntax
            .patterns
            .iter()
            .map(|pattern| decode_html_entities(pattern).into_owned())
            .collect(),
        examples: Some(examples),
        required_addon: Some(ADDON.to_string()),
        required_addon_version: normalize_addon_version(
            syntax.since.first().map(String::as_str),
        ),
        required_minecraft_version: None,
        syntax_type: category.syntax_type,
        required_plugins: (!syntax.requirements.is_empty()).then_some(syntax.requirements),
        return_type: syntax.return_type,
        event_values: (!syntax.event_values.is_empty()).then_some(syntax.event_values),
        cancellable: syntax.cancellable,
    }
}

/// Filters `catalog` to entries mentioning `query` (case-insensitive).
///
/// Entries matching in both name and description come first, then name-only,
/// then description-only. Catalog order is kept within each tier.
#[must_use]
pub fn rank_matches(catalog: &[DocumentationElement], query: &str) -> Vec<DocumentationElement> {
    let needle = query.trim().to_lowercase();
    let mut tiers: [Vec<&DocumentationElement>; 3] = Default::default();
    for element in catalog {
        let in_name = element.name.to_lowercase().contains(&needle);
        let in_description = element.description.to_lowercase().contains(&needle);
        let tier = match (in_name, in_description) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => continue,
        };
        tiers[tier].push(element);
    }
    tiers.into_iter().flatten().cloned().collect()
}

#[async_trait]
impl DocumentationProvider for SkriptLangClient {
    fn name(&self) -> &str {
        NAME
    }

    fn icon_url(&self) -> Option<&str> {
        Some(ICON_URL)
    }

    #[instrument(name = "skriptlang_client.search", skip(self))]
    async fn search(&self, query: &Query) -> Result<Vec<DocumentationElement>, ProviderError> {
        let catalog = self.catalog.get_or_refresh(|| self.fetch_catalog()).await?;
        Ok(rank_matches(&catalog, query.as_str()))
    }
}
