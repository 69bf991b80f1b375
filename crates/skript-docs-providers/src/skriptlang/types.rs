use serde::{Deserialize, Serialize};
use skript_docs_client::types::SyntaxType;

use crate::de::string_list;

/// One entry of a category array in `docs.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkriptLangSyntax {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "string_list_lines")]
    pub description: Vec<String>,
    #[serde(default, deserialize_with = "string_list_lines")]
    pub patterns: Vec<String>,
    #[serde(default, deserialize_with = "string_list_lines")]
    pub examples: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub since: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub requirements: Vec<String>,
    #[serde(default, rename = "return type")]
    pub return_type: Option<String>,
    #[serde(default, rename = "event values", deserialize_with = "string_list")]
    pub event_values: Vec<String>,
    #[serde(default)]
    pub cancellable: Option<bool>,
}

/// Like [`string_list`] but never splits on commas: these fields hold prose and code.
fn string_list_lines<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lines {
        Many(Vec<String>),
        One(String),
    }

    Ok(match Option::<Lines>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Lines::Many(lines)) => lines,
        Some(Lines::One(text)) => text.lines().map(str::to_string).collect(),
    })
}

/// A `docs.json` category key: the syntax type it maps to and its page on the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub syntax_type: SyntaxType,
    pub page: &'static str,
}

impl Category {
    pub fn from_key(key: &str) -> Option<Self> {
        let (syntax_type, page) = match key {
            "conditions" => (SyntaxType::Condition, "conditions"),
            "effects" => (SyntaxType::Effect, "effects"),
            "expressions" => (SyntaxType::Expression, "expressions"),
            "events" => (SyntaxType::Event, "events"),
            "types" | "classes" => (SyntaxType::ClassInfo, "classes"),
            "sections" => (SyntaxType::Section, "sections"),
            "structures" => (SyntaxType::Section, "structures"),
            "functions" => (SyntaxType::Function, "functions"),
            _ => return None,
        };
        Some(Self { syntax_type, page })
    }
}
