//! In-memory backend for dashboard tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use copilot_client::{ApiError, ComplianceApi, FilePayload};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_types::{
    AnonymizationInfo, AnonymizeRequest, AnonymizeResponse, ComplianceFlag, CorrectedDocument,
    CorrelationResponse, DocumentAnalysis, Evidence, ExplainResult, HealthResponse,
    LiveActivityResponse, NewDocument, PathwaySearchRequest, PathwaySearchResponse, PathwayStats,
    Region, RiskLevel, RuleDocument, RuleList, SaveRuleResponse, SimplifiedAnalysis,
    SystemStatus, TablesResponse, UploadContractResponse, UploadRuleResponse,
};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Records every call, answers from canned JSON, and can hold a call open
/// until its gate is notified.
///
/// Responses are keyed by endpoint name (`"check"`, `"explain"`, ...).
/// Unstubbed endpoints answer `500 - not stubbed`.
#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<String>>,
    uploads: Mutex<Vec<FilePayload>>,
    responses: Mutex<HashMap<&'static str, Result<Value, ApiError>>>,
    gates: Mutex<HashMap<&'static str, Arc<Notify>>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, key: &'static str, value: Value) {
        self.responses.lock().unwrap().insert(key, Ok(value));
    }

    pub fn fail(&self, key: &'static str, err: ApiError) {
        self.responses.lock().unwrap().insert(key, Err(err));
    }

    /// Block calls to `key` until the returned handle is notified
    pub fn gate(&self, key: &'static str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(key, Arc::clone(&notify));
        notify
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn uploads(&self) -> Vec<FilePayload> {
        self.uploads.lock().unwrap().clone()
    }

    async fn reply<T: DeserializeOwned>(
        &self,
        call: String,
        key: &'static str,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError> {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        self.calls.lock().unwrap().push(call);

        let gate = self.gates.lock().unwrap().get(key).cloned();
        if let Some(gate) = gate {
            tokio::select! {
                _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                _ = gate.notified() => {}
            }
        }

        let response = self.responses.lock().unwrap().get(key).cloned();
        let value = response.unwrap_or_else(|| {
            Err(ApiError::Http {
                status: 500,
                message: "not stubbed".to_string(),
            })
        })?;
        serde_json::from_value(value.clone()).map_err(|e| ApiError::Malformed {
            reason: e.to_string(),
            raw: value.to_string(),
        })
    }
}

#[async_trait]
impl ComplianceApi for FakeApi {
    async fn health(&self, cancel: &CancellationToken) -> Result<HealthResponse, ApiError> {
        self.reply("GET /health".to_string(), "health", cancel).await
    }

    async fn upload_contract(
        &self,
        file: FilePayload,
        cancel: &CancellationToken,
    ) -> Result<UploadContractResponse, ApiError> {
        let call = format!("POST /upload_contract {}", file.file_name);
        self.uploads.lock().unwrap().push(file);
        self.reply(call, "upload_contract", cancel).await
    }

    async fn upload_rule(
        &self,
        file: FilePayload,
        cancel: &CancellationToken,
    ) -> Result<UploadRuleResponse, ApiError> {
        let call = format!("POST /upload_rule {}", file.file_name);
        self.uploads.lock().unwrap().push(file);
        self.reply(call, "upload_rule", cancel).await
    }

    async fn list_rules(&self, cancel: &CancellationToken) -> Result<RuleList, ApiError> {
        self.reply("GET /rules".to_string(), "rules", cancel).await
    }

    async fn get_rule(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<RuleDocument, ApiError> {
        self.reply(format!("GET /rule?name={}", name), "get_rule", cancel)
            .await
    }

    async fn save_rule(
        &self,
        rule: &RuleDocument,
        cancel: &CancellationToken,
    ) -> Result<SaveRuleResponse, ApiError> {
        self.reply(format!("POST /rule {}", rule.name), "save_rule", cancel)
            .await
    }

    async fn check(
        &self,
        region: Region,
        cancel: &CancellationToken,
    ) -> Result<Vec<ComplianceFlag>, ApiError> {
        self.reply(format!("GET /check?region={}", region.code()), "check", cancel)
            .await
    }

    async fn explain(
        &self,
        flag_id: &str,
        region: Region,
        cancel: &CancellationToken,
    ) -> Result<ExplainResult, ApiError> {
        let call = format!("GET /explain?id={}&region={}", flag_id, region.code());
        self.reply(call, "explain", cancel).await
    }

    async fn risk_correlation(
        &self,
        region: Region,
        cancel: &CancellationToken,
    ) -> Result<CorrelationResponse, ApiError> {
        let call = format!("GET /risk_correlation?region={}", region.code());
        self.reply(call, "risk_correlation", cancel).await
    }

    async fn extract_tables(&self, cancel: &CancellationToken) -> Result<TablesResponse, ApiError> {
        self.reply("GET /extract_tables".to_string(), "extract_tables", cancel)
            .await
    }

    async fn system_status(&self, cancel: &CancellationToken) -> Result<SystemStatus, ApiError> {
        self.reply("GET /system_status".to_string(), "system_status", cancel)
            .await
    }

    async fn pathway_search(
        &self,
        request: &PathwaySearchRequest,
        cancel: &CancellationToken,
    ) -> Result<PathwaySearchResponse, ApiError> {
        let call = format!("POST /pathway_search {} top_k={}", request.query, request.top_k);
        self.reply(call, "pathway_search", cancel).await
    }

    async fn pathway_stats(&self, cancel: &CancellationToken) -> Result<PathwayStats, ApiError> {
        self.reply("GET /pathway_stats".to_string(), "pathway_stats", cancel)
            .await
    }

    async fn live_activity(
        &self,
        cancel: &CancellationToken,
    ) -> Result<LiveActivityResponse, ApiError> {
        self.reply(
            "GET /pathway_live_activity".to_string(),
            "live_activity",
            cancel,
        )
        .await
    }

    async fn add_document(
        &self,
        document: &NewDocument,
        cancel: &CancellationToken,
    ) -> Result<Value, ApiError> {
        let call = format!("POST /pathway_add_document {}", document.name);
        self.reply(call, "add_document", cancel).await
    }

    async fn anonymization_info(
        &self,
        cancel: &CancellationToken,
    ) -> Result<AnonymizationInfo, ApiError> {
        self.reply(
            "GET /anonymization_info".to_string(),
            "anonymization_info",
            cancel,
        )
        .await
    }

    async fn anonymize(
        &self,
        request: &AnonymizeRequest,
        cancel: &CancellationToken,
    ) -> Result<AnonymizeResponse, ApiError> {
        let call = format!(
            "POST /anonymize_data method={} flags={}",
            request.method,
            request.data.len()
        );
        self.reply(call, "anonymize", cancel).await
    }

    async fn analyze_document(
        &self,
        region: Region,
        cancel: &CancellationToken,
    ) -> Result<DocumentAnalysis, ApiError> {
        let call = format!("GET /analyze_document?region={}", region.code());
        self.reply(call, "analyze_document", cancel).await
    }

    async fn generate_corrected_document(
        &self,
        region: Region,
        cancel: &CancellationToken,
    ) -> Result<CorrectedDocument, ApiError> {
        let call = format!("GET /generate_corrected_document?region={}", region.code());
        self.reply(call, "generate_corrected_document", cancel)
            .await
    }

    async fn download_corrected_document(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ApiError> {
        let text: String = self
            .reply(
                "GET /download_corrected_document".to_string(),
                "download_corrected_document",
                cancel,
            )
            .await?;
        Ok(text.into_bytes())
    }

    async fn simplified_analysis(
        &self,
        region: Region,
        domain: &str,
        cancel: &CancellationToken,
    ) -> Result<SimplifiedAnalysis, ApiError> {
        let call = format!(
            "GET /simplified_analysis?region={}&domain={}",
            region.code(),
            domain
        );
        self.reply(call, "simplified_analysis", cancel).await
    }
}

pub fn flag(id: &str, level: RiskLevel) -> ComplianceFlag {
    ComplianceFlag {
        id: id.to_string(),
        category: "privacy".to_string(),
        region: "US".to_string(),
        risk_level: level,
        rationale: "Retention period not stated".to_string(),
        contract_evidence: Evidence {
            file: "nda.pdf".to_string(),
            page: Some(3),
            section: None,
        },
        rule_evidence: Evidence {
            file: "ccpa.md".to_string(),
            page: None,
            section: Some("1798.100".to_string()),
        },
    }
}

/// Write `contents` to a fresh file under the system temp dir
pub fn temp_file(name: &str, contents: &[u8]) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "copilot-dashboard-{}-{}",
        std::process::id(),
        name.replace('.', "-")
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
