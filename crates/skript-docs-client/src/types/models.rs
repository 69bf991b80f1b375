use std::fmt;

use serde::{Deserialize, Serialize};

/// Free-text search term. Providers treat it as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query(String);

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lookup handle pointing back at the provider that produced an element.
///
/// Holds the provider's display name, which is unique across a registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildId(pub u64);

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Syntax category shared by every documentation source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyntaxType {
    Effect,
    Condition,
    Expression,
    Section,
    Function,
    Event,
    ClassInfo,
}

impl SyntaxType {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Effect => "Effect",
            Self::Condition => "Condition",
            Self::Expression => "Expression",
            Self::Section => "Section",
            Self::Function => "Function",
            Self::Event => "Event",
            Self::ClassInfo => "Type",
        }
    }

    /// Accent colour of the detail panel, as a 24-bit RGB value.
    #[must_use]
    pub fn colour(self) -> u32 {
        match self {
            Self::Effect => 0x0034_98DB,
            Self::Condition => 0x00E6_7E22,
            Self::Expression => 0x002E_CC71,
            Self::Section => 0x009B_59B6,
            Self::Function => 0x00F1_C40F,
            Self::Event => 0x00E7_4C3C,
            Self::ClassInfo => 0x001A_BC9C,
        }
    }

    #[must_use]
    pub fn emoji(self) -> &'static str {
        match self {
            Self::Effect => "⚡",
            Self::Condition => "❓",
            Self::Expression => "🧮",
            Self::Section => "📦",
            Self::Function => "🔧",
            Self::Event => "📅",
            Self::ClassInfo => "🏷️",
        }
    }
}

impl fmt::Display for SyntaxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A provider-agnostic documentation entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentationElement {
    /// Provider-local identifier. Not unique across providers.
    pub id: String,
    pub provider: ProviderId,
    pub name: String,
    pub description: String,
    pub patterns: Vec<String>,
    /// `None` until fetched; `Some(vec![])` once fetched with no examples.
    pub examples: Option<Vec<String>>,
    pub required_addon: Option<String>,
    pub required_addon_version: Option<String>,
    pub required_minecraft_version: Option<String>,
    #[serde(rename = "type")]
    pub syntax_type: SyntaxType,
    pub required_plugins: Option<Vec<String>>,
    pub return_type: Option<String>,
    pub event_values: Option<Vec<String>>,
    pub cancellable: Option<bool>,
    pub link: Option<String>,
}

impl DocumentationElement {
    /// `provider:id`, unique within one result list. Used as the option value in pickers.
    #[must_use]
    pub fn global_key(&self) -> String {
        format!("{}:{}", self.provider, self.id)
    }

    /// `addon: name`, the cross-provider deduplication key and picker label.
    #[must_use]
    pub fn detailed_name(&self) -> String {
        match &self.required_addon {
            Some(addon) => format!("{addon}: {}", self.name),
            None => self.name.clone(),
        }
    }

    #[must_use]
    pub fn examples_fetched(&self) -> bool {
        self.examples.is_some()
    }
}

/// Per-guild preferences. Both fields stay `None` until explicitly set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildConfig {
    /// Provider keys in preference order. `None` means every registered provider.
    #[serde(default)]
    pub preferred_providers: Option<Vec<String>>,
    #[serde(default)]
    pub enforce_preferred_providers: Option<bool>,
}

impl GuildConfig {
    #[must_use]
    pub fn enforces_preferred_providers(&self) -> bool {
        self.enforce_preferred_providers.unwrap_or(false)
    }
}
