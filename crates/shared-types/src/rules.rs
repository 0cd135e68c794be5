//! Rule library models used by the inline rule editor

use serde::{Deserialize, Serialize};

/// Entry in `GET /rules`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mtime: Option<f64>,
    #[serde(default)]
    pub ext: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleList {
    #[serde(default)]
    pub items: Vec<RuleSummary>,
}

/// A rule's editable text, fetched by `GET /rule?name=` and saved by `POST /rule`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDocument {
    pub name: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadRuleResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub path: Option<String>,
}

/// The backend normalizes the name (adds `.md`, fills in a default) so the
/// saved name can differ from the one sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveRuleResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}
