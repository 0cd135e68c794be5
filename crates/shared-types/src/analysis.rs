//! Derived-analysis payloads: explanations, risk correlations, extracted
//! tables, system status, the combined "simplified" bundle, document
//! correction and data anonymization.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ComplianceFlag, RiskLevel};

/// Evidence span quoted in an explanation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplainEvidence {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplainContract {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub evidence: Option<ExplainEvidence>,
}

/// `GET /explain?id=&region=`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplainResult {
    pub id: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub contract: Option<ExplainContract>,
    #[serde(default)]
    pub rule_snippet: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskIndicator {
    #[serde(default)]
    pub indicator: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub value: String,
}

/// A field named by a correlation. Older payloads send bare names, newer ones
/// send `{ "name", "value" }` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrelationField {
    Named {
        #[serde(default)]
        name: String,
        #[serde(default)]
        value: String,
    },
    Bare(String),
}

impl CorrelationField {
    pub fn name(&self) -> &str {
        match self {
            CorrelationField::Named { name, .. } => name,
            CorrelationField::Bare(name) => name,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            CorrelationField::Named { value, .. } if !value.is_empty() => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for CorrelationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => write!(f, "{} = {}", self.name(), value),
            None => f.write_str(self.name()),
        }
    }
}

/// Relationship between several fields/flags that compounds risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCorrelation {
    pub correlation_type: String,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<CorrelationField>,
    #[serde(default)]
    pub jurisdictions: Vec<String>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub matching_fields: Option<u32>,
    #[serde(default)]
    pub risk_indicators: Vec<RiskIndicator>,
}

/// `GET /risk_correlation?region=`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResponse {
    #[serde(default)]
    pub correlations: Vec<RiskCorrelation>,
}

/// A table found in the contract. Either structured (`headers` + `rows`) or
/// raw (`content` only), depending on what the extraction model produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTable {
    #[serde(default)]
    pub table_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub page: Option<u32>,
}

impl ExtractedTable {
    pub fn is_structured(&self) -> bool {
        !self.headers.is_empty() || !self.rows.is_empty()
    }
}

/// `GET /extract_tables`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TablesResponse {
    #[serde(default)]
    pub tables: Vec<ExtractedTable>,
}

/// `GET /system_status`. The two capability flags the UI cares about are
/// typed; anything else the backend reports is kept for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub landingai_available: bool,
    #[serde(default)]
    pub pathway_available: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// `GET /simplified_analysis?region=&domain=`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedAnalysis {
    #[serde(default)]
    pub document_path: Option<String>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub extracted_fields: Vec<Value>,
    #[serde(default, alias = "claude_rules")]
    pub generated_rules: Vec<Value>,
    #[serde(default)]
    pub relevant_rules: Vec<Value>,
    #[serde(default)]
    pub compliance_flags: Vec<Value>,
    #[serde(default)]
    pub risk_correlations: Vec<Value>,
    #[serde(default)]
    pub analysis_timestamp: Option<String>,
}

/// One suggested edit produced by the correction engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionOpportunity {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub flag_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub original_text: Option<String>,
    #[serde(default)]
    pub correction_suggestion: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub ai_generated: bool,
}

/// `GET /analyze_document`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    #[serde(default)]
    pub document_path: Option<String>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub correction_opportunities: Vec<CorrectionOpportunity>,
    #[serde(default)]
    pub analysis_timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSummary {
    #[serde(default)]
    pub total_corrections: u32,
    #[serde(default)]
    pub high_priority_corrections: u32,
    #[serde(default)]
    pub medium_priority_corrections: u32,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// `GET /generate_corrected_document`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectedDocument {
    #[serde(default)]
    pub original_path: Option<String>,
    #[serde(default)]
    pub corrected_content: String,
    #[serde(default)]
    pub changes_applied: u32,
    #[serde(default)]
    pub change_summary: ChangeSummary,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub generation_timestamp: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnonymizationMethod {
    Hash,
    #[default]
    Mask,
    Replace,
    Remove,
}

impl AnonymizationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnonymizationMethod::Hash => "hash",
            AnonymizationMethod::Mask => "mask",
            AnonymizationMethod::Replace => "replace",
            AnonymizationMethod::Remove => "remove",
        }
    }
}

impl fmt::Display for AnonymizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnonymizationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hash" => Ok(AnonymizationMethod::Hash),
            "mask" => Ok(AnonymizationMethod::Mask),
            "replace" => Ok(AnonymizationMethod::Replace),
            "remove" => Ok(AnonymizationMethod::Remove),
            other => Err(format!(
                "unknown anonymization method '{}' (expected hash, mask, replace or remove)",
                other
            )),
        }
    }
}

/// `GET /anonymization_info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnonymizationInfo {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Body of `POST /anonymize_data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymizeRequest {
    pub data: Vec<ComplianceFlag>,
    pub method: AnonymizationMethod,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnonymizeResponse {
    #[serde(default, alias = "anonymized_flags")]
    pub data: Vec<Value>,
    #[serde(default)]
    pub summary: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explain_without_contract() {
        let json = r#"{"id":"flag-1","region":"EU","rule_snippet":"clause text"}"#;
        let result: ExplainResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.rule_snippet, "clause text");
        assert!(result.contract.is_none());
    }

    #[test]
    fn test_explain_with_null_evidence() {
        let json = r#"{"id":"privacy-x","region":"EU","contract":{"path":"c.pdf","evidence":null},"rule_snippet":""}"#;
        let result: ExplainResult = serde_json::from_str(json).unwrap();
        let contract = result.contract.unwrap();
        assert_eq!(contract.path, "c.pdf");
        assert!(contract.evidence.is_none());
    }

    #[test]
    fn test_correlation_backend_shape() {
        let json = r#"{"correlations":[{
            "correlation_type":"data_transfer_risk",
            "description":"Cross-border transfer without safeguards",
            "risk_level":"HIGH",
            "matching_fields":2,
            "risk_indicators":[{"indicator":"transfer","field":"data_location","value":"US"}],
            "region":"EU",
            "confidence":0.8
        }]}"#;
        let resp: CorrelationResponse = serde_json::from_str(json).unwrap();
        let corr = &resp.correlations[0];
        assert_eq!(corr.risk_level, RiskLevel::High);
        assert_eq!(corr.risk_indicators[0].field, "data_location");
        assert!(corr.fields.is_empty());
    }

    #[test]
    fn test_correlation_variants_in_one_response() {
        let json = r#"{"correlations":[
            {
                "correlation_type":"data_transfer_risk",
                "description":"Cross-border transfer without safeguards",
                "risk_level":"MEDIUM",
                "matching_fields":1,
                "risk_indicators":[{"indicator":"transfer","field":"data_location","value":"US","evidence":{"file":"c.pdf"}}],
                "region":"EU",
                "confidence":0.6
            },
            {
                "correlation_type":"temporal_conflict",
                "description":"Conflicting notice periods found across documents",
                "risk_level":"MEDIUM",
                "fields":[
                    {"name":"termination_notice","value":"30 days"},
                    {"name":"notice_period","value":"90 days"}
                ],
                "region":"EU",
                "confidence":0.7
            },
            {
                "correlation_type":"jurisdiction_conflict",
                "description":"Multiple jurisdictions found - potential legal conflicts",
                "risk_level":"HIGH",
                "jurisdictions":["Germany","California"],
                "region":"EU",
                "confidence":0.8
            }
        ]}"#;
        let resp: CorrelationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.correlations.len(), 3);

        let temporal = &resp.correlations[1];
        assert_eq!(temporal.fields[0].name(), "termination_notice");
        assert_eq!(temporal.fields[1].value(), Some("90 days"));
        assert_eq!(temporal.fields[0].to_string(), "termination_notice = 30 days");

        let conflict = &resp.correlations[2];
        assert_eq!(conflict.jurisdictions, vec!["Germany", "California"]);
        assert!(conflict.fields.is_empty());
    }

    #[test]
    fn test_correlation_field_accepts_bare_name() {
        let field: CorrelationField = serde_json::from_str(r#""late_fee""#).unwrap();
        assert_eq!(field.name(), "late_fee");
        assert_eq!(field.value(), None);
        assert_eq!(field.to_string(), "late_fee");
    }

    #[test]
    fn test_raw_table_is_not_structured() {
        let table = ExtractedTable {
            content: Some("| a | b |".to_string()),
            ..Default::default()
        };
        assert!(!table.is_structured());
    }

    #[test]
    fn test_system_status_extra_flags() {
        let json = r#"{"landingai_available":true,"pathway_available":false,"claude_available":true}"#;
        let status: SystemStatus = serde_json::from_str(json).unwrap();
        assert!(status.landingai_available);
        assert!(!status.pathway_available);
        assert_eq!(status.extra.get("claude_available"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_anonymization_method_parse() {
        assert_eq!("HASH".parse::<AnonymizationMethod>().unwrap(), AnonymizationMethod::Hash);
        assert!("scramble".parse::<AnonymizationMethod>().is_err());
    }
}
