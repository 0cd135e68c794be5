use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

lazy_static! {
    /// Matches a serialized internal object that carries its real text in a
    /// `markdown="..."` attribute instead of plain text.
    static ref LEAKED_MARKDOWN: Regex = Regex::new(r#"\bmarkdown="[^"]*""#).unwrap();
}

/// Jurisdiction scoping which rule set the backend applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    #[default]
    Eu,
    Us,
    In,
    Uk,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::Eu, Region::Us, Region::In, Region::Uk];

    /// Query-string code (`EU`, `US`, `IN`, `UK`)
    pub fn code(&self) -> &'static str {
        match self {
            Region::Eu => "EU",
            Region::Us => "US",
            Region::In => "IN",
            Region::Uk => "UK",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown region '{0}' (expected one of EU, US, IN, UK)")]
pub struct ParseRegionError(pub String);

impl FromStr for Region {
    type Err = ParseRegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EU" => Ok(Region::Eu),
            "US" => Ok(Region::Us),
            "IN" => Ok(Region::In),
            "UK" => Ok(Region::Uk),
            _ => Err(ParseRegionError(s.to_string())),
        }
    }
}

/// Risk level attached to flags and correlations.
///
/// The backend is inconsistent (`MED` vs `MEDIUM`, occasionally free text), so
/// unknown values are kept verbatim instead of failing the whole payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    Unknown(String),
}

impl RiskLevel {
    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::High => "HIGH",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::Low => "LOW",
            RiskLevel::Unknown(raw) => raw,
        }
    }
}

impl From<String> for RiskLevel {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "HIGH" => RiskLevel::High,
            "MEDIUM" | "MED" => RiskLevel::Medium,
            "LOW" => RiskLevel::Low,
            _ => RiskLevel::Unknown(raw),
        }
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pointer into a contract (file + page) or rule document (file + section)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub section: Option<String>,
}

/// A single compliance issue for a contract/region pair, as returned by `/check`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceFlag {
    pub id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub region: String,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub contract_evidence: Evidence,
    #[serde(default)]
    pub rule_evidence: Evidence,
}

/// Field extracted from an uploaded contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractField {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub evidence: Evidence,
}

impl ContractField {
    /// True when `value` holds a serialized internal object rather than plain
    /// text. This is a backend defect; callers report it and display the value
    /// unchanged.
    pub fn has_leaked_representation(&self) -> bool {
        LEAKED_MARKDOWN.is_match(&self.value)
    }
}

/// `POST /upload_contract`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadContractResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub fields: Vec<ContractField>,
}

/// `GET /health`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub ok: bool,
}
