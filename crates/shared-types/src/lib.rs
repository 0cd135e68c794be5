//! Shared wire and view models for the Compliance Copilot client.
//!
//! Everything in here is deserialized from backend JSON and treated as
//! read-only display data. Fetches replace whole collections; nothing is
//! patched in place.

pub mod analysis;
pub mod pathway;
pub mod rules;
pub mod types;

pub use analysis::{
    AnonymizationInfo, AnonymizationMethod, AnonymizeRequest, AnonymizeResponse, ChangeSummary,
    CorrectedDocument, CorrectionOpportunity, CorrelationField, CorrelationResponse,
    DocumentAnalysis, ExplainContract, ExplainEvidence, ExplainResult, ExtractedTable,
    RiskCorrelation, RiskIndicator, SimplifiedAnalysis, SystemStatus, TablesResponse,
};
pub use pathway::{
    DocumentKind, LiveActivity, LiveActivityResponse, NewDocument, PathwaySearchRequest,
    PathwaySearchResponse, PathwaySearchResult, PathwayStats,
};
pub use rules::{RuleDocument, RuleList, RuleSummary, SaveRuleResponse, UploadRuleResponse};
pub use types::{
    ComplianceFlag, ContractField, Evidence, HealthResponse, ParseRegionError, Region, RiskLevel,
    UploadContractResponse,
};
