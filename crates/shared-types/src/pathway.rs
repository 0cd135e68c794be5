//! Models for the Pathway live-indexing panel

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /pathway_search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwaySearchRequest {
    pub query: String,
    pub top_k: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwaySearchResult {
    #[serde(default, alias = "text")]
    pub content: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathwaySearchResponse {
    #[serde(default)]
    pub results: Vec<PathwaySearchResult>,
}

/// `GET /pathway_stats`; only the document count is relied on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathwayStats {
    #[serde(default)]
    pub document_count: u64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveActivity {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, alias = "type")]
    pub action: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /pathway_live_activity`. Older backends name the list `activity`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveActivityResponse {
    #[serde(default, alias = "activity")]
    pub activities: Vec<LiveActivity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    #[default]
    Rule,
    Contract,
}

/// Body of `POST /pathway_add_document`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub content: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
}
