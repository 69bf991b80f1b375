use serde::{Deserialize, Serialize};

use crate::de::{flexible_id, string_list};

/// Envelope of `GET /api/?function=doSearch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkUnitySearchResponse {
    pub result: SkUnitySearchResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkUnitySearchResult {
    #[serde(default)]
    pub records: Vec<SkUnityRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkUnityRecord {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
    pub pattern: String,
    #[serde(default)]
    pub examples: Vec<SkUnityExample>,
    #[serde(default)]
    pub addon: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Category, e.g. `expressions` or `events`.
    pub doc: String,
    #[serde(default, deserialize_with = "string_list")]
    pub plugin: Vec<String>,
    #[serde(default)]
    pub returntype: Option<String>,
    #[serde(default)]
    pub eventvalues: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkUnityExample {
    pub example: String,
}
