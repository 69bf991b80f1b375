use serde::{Deserialize, Serialize};

use crate::de::flexible_id;

/// One row of `GET /api/v1/syntax/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkriptHubSyntax {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub syntax_pattern: String,
    #[serde(default)]
    pub addon: Option<String>,
    #[serde(default)]
    pub compatible_addon_version: Option<String>,
    #[serde(default)]
    pub compatible_minecraft_version: Option<String>,
    pub syntax_type: String,
    #[serde(default)]
    pub required_plugins: Vec<SkriptHubPlugin>,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub event_values: Option<String>,
    #[serde(default)]
    pub event_cancellable: Option<bool>,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkriptHubPlugin {
    pub name: String,
}

/// One row of `GET /api/v1/syntaxexample/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkriptHubExample {
    pub example_code: String,
}

/// Splits Skript Hub's `"event-player, event-world"` notation.
pub(crate) fn split_event_values(raw: &str) -> Vec<String> {
    raw.split(", ")
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn plugin_names(plugins: &[SkriptHubPlugin]) -> Vec<String> {
    plugins.iter().map(|plugin| plugin.name.clone()).collect()
}

#[cfg(test)]
pub(crate) fn sample_syntax() -> serde_json::Value {
    serde_json::json!({
        "id": 1203,
        "title": "Give",
        "description": "Gives an item to a player.",
        "syntax_pattern": "(give|add) %itemtypes% to %inventories/players%\ngive %players% %itemtypes%",
        "addon": "Skript",
        "compatible_addon_version": "Unknown",
        "compatible_minecraft_version": "1.8",
        "syntax_type": "effect",
        "required_plugins": [{"name": "Vault"}],
        "return_type": null,
        "event_values": null,
        "event_cancellable": null,
        "link": "https://skripthub.net/docs/?id=1203"
    })
}
