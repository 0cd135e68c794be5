//! One method per backend capability

use async_trait::async_trait;
use serde_json::Value;
use shared_types::{
    AnonymizationInfo, AnonymizeRequest, AnonymizeResponse, ComplianceFlag, CorrectedDocument,
    CorrelationResponse, DocumentAnalysis, ExplainResult, HealthResponse, LiveActivityResponse,
    NewDocument, PathwaySearchRequest, PathwaySearchResponse, PathwayStats, Region, RuleDocument,
    RuleList, SaveRuleResponse, SimplifiedAnalysis, SystemStatus, TablesResponse,
    UploadContractResponse, UploadRuleResponse,
};
use tokio_util::sync::CancellationToken;

use crate::client::{ApiClient, Endpoint, FilePayload};
use crate::error::ApiError;

/// The backend as seen by the dashboard.
///
/// [`ApiClient`] is the production implementation; tests substitute an
/// in-memory fake.
#[async_trait]
pub trait ComplianceApi: Send + Sync {
    async fn health(&self, cancel: &CancellationToken) -> Result<HealthResponse, ApiError>;

    async fn upload_contract(
        &self,
        file: FilePayload,
        cancel: &CancellationToken,
    ) -> Result<UploadContractResponse, ApiError>;

    async fn upload_rule(
        &self,
        file: FilePayload,
        cancel: &CancellationToken,
    ) -> Result<UploadRuleResponse, ApiError>;

    async fn list_rules(&self, cancel: &CancellationToken) -> Result<RuleList, ApiError>;

    async fn get_rule(&self, name: &str, cancel: &CancellationToken)
        -> Result<RuleDocument, ApiError>;

    async fn save_rule(
        &self,
        rule: &RuleDocument,
        cancel: &CancellationToken,
    ) -> Result<SaveRuleResponse, ApiError>;

    async fn check(
        &self,
        region: Region,
        cancel: &CancellationToken,
    ) -> Result<Vec<ComplianceFlag>, ApiError>;

    async fn explain(
        &self,
        flag_id: &str,
        region: Region,
        cancel: &CancellationToken,
    ) -> Result<ExplainResult, ApiError>;

    async fn risk_correlation(
        &self,
        region: Region,
        cancel: &CancellationToken,
    ) -> Result<CorrelationResponse, ApiError>;

    async fn extract_tables(&self, cancel: &CancellationToken) -> Result<TablesResponse, ApiError>;

    async fn system_status(&self, cancel: &CancellationToken) -> Result<SystemStatus, ApiError>;

    async fn pathway_search(
        &self,
        request: &PathwaySearchRequest,
        cancel: &CancellationToken,
    ) -> Result<PathwaySearchResponse, ApiError>;

    async fn pathway_stats(&self, cancel: &CancellationToken) -> Result<PathwayStats, ApiError>;

    async fn live_activity(
        &self,
        cancel: &CancellationToken,
    ) -> Result<LiveActivityResponse, ApiError>;

    async fn add_document(
        &self,
        document: &NewDocument,
        cancel: &CancellationToken,
    ) -> Result<Value, ApiError>;

    async fn anonymization_info(
        &self,
        cancel: &CancellationToken,
    ) -> Result<AnonymizationInfo, ApiError>;

    async fn anonymize(
        &self,
        request: &AnonymizeRequest,
        cancel: &CancellationToken,
    ) -> Result<AnonymizeResponse, ApiError>;

    async fn analyze_document(
        &self,
        region: Region,
        cancel: &CancellationToken,
    ) -> Result<DocumentAnalysis, ApiError>;

    async fn generate_corrected_document(
        &self,
        region: Region,
        cancel: &CancellationToken,
    ) -> Result<CorrectedDocument, ApiError>;

    async fn download_corrected_document(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ApiError>;

    async fn simplified_analysis(
        &self,
        region: Region,
        domain: &str,
        cancel: &CancellationToken,
    ) -> Result<SimplifiedAnalysis, ApiError>;
}

#[async_trait]
impl ComplianceApi for ApiClient {
    async fn health(&self, cancel: &CancellationToken) -> Result<HealthResponse, ApiError> {
        self.request(Endpoint::get("/health"), cancel).await
    }

    async fn upload_contract(
        &self,
        file: FilePayload,
        cancel: &CancellationToken,
    ) -> Result<UploadContractResponse, ApiError> {
        self.request(Endpoint::post("/upload_contract").file(file), cancel)
            .await
    }

    async fn upload_rule(
        &self,
        file: FilePayload,
        cancel: &CancellationToken,
    ) -> Result<UploadRuleResponse, ApiError> {
        self.request(Endpoint::post("/upload_rule").file(file), cancel)
            .await
    }

    async fn list_rules(&self, cancel: &CancellationToken) -> Result<RuleList, ApiError> {
        self.request(Endpoint::get("/rules"), cancel).await
    }

    async fn get_rule(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<RuleDocument, ApiError> {
        self.request(Endpoint::get("/rule").query("name", name), cancel)
            .await
    }

    async fn save_rule(
        &self,
        rule: &RuleDocument,
        cancel: &CancellationToken,
    ) -> Result<SaveRuleResponse, ApiError> {
        self.request(Endpoint::post("/rule").json(rule)?, cancel).await
    }

    async fn check(
        &self,
        region: Region,
        cancel: &CancellationToken,
    ) -> Result<Vec<ComplianceFlag>, ApiError> {
        self.request(Endpoint::get("/check").query("region", region.code()), cancel)
            .await
    }

    async fn explain(
        &self,
        flag_id: &str,
        region: Region,
        cancel: &CancellationToken,
    ) -> Result<ExplainResult, ApiError> {
        let endpoint = Endpoint::get("/explain")
            .query("id", flag_id)
            .query("region", region.code());
        self.request(endpoint, cancel).await
    }

    async fn risk_correlation(
        &self,
        region: Region,
        cancel: &CancellationToken,
    ) -> Result<CorrelationResponse, ApiError> {
        self.request(
            Endpoint::get("/risk_correlation").query("region", region.code()),
            cancel,
        )
        .await
    }

    async fn extract_tables(&self, cancel: &CancellationToken) -> Result<TablesResponse, ApiError> {
        self.request(Endpoint::get("/extract_tables"), cancel).await
    }

    async fn system_status(&self, cancel: &CancellationToken) -> Result<SystemStatus, ApiError> {
        self.request(Endpoint::get("/system_status"), cancel).await
    }

    async fn pathway_search(
        &self,
        request: &PathwaySearchRequest,
        cancel: &CancellationToken,
    ) -> Result<PathwaySearchResponse, ApiError> {
        self.request(Endpoint::post("/pathway_search").json(request)?, cancel)
            .await
    }

    async fn pathway_stats(&self, cancel: &CancellationToken) -> Result<PathwayStats, ApiError> {
        self.request(Endpoint::get("/pathway_stats"), cancel).await
    }

    async fn live_activity(
        &self,
        cancel: &CancellationToken,
    ) -> Result<LiveActivityResponse, ApiError> {
        self.request(Endpoint::get("/pathway_live_activity"), cancel)
            .await
    }

    async fn add_document(
        &self,
        document: &NewDocument,
        cancel: &CancellationToken,
    ) -> Result<Value, ApiError> {
        self.request(Endpoint::post("/pathway_add_document").json(document)?, cancel)
            .await
    }

    async fn anonymization_info(
        &self,
        cancel: &CancellationToken,
    ) -> Result<AnonymizationInfo, ApiError> {
        self.request(Endpoint::get("/anonymization_info"), cancel)
            .await
    }

    async fn anonymize(
        &self,
        request: &AnonymizeRequest,
        cancel: &CancellationToken,
    ) -> Result<AnonymizeResponse, ApiError> {
        self.request(Endpoint::post("/anonymize_data").json(request)?, cancel)
            .await
    }

    async fn analyze_document(
        &self,
        region: Region,
        cancel: &CancellationToken,
    ) -> Result<DocumentAnalysis, ApiError> {
        self.request(
            Endpoint::get("/analyze_document").query("region", region.code()),
            cancel,
        )
        .await
    }

    async fn generate_corrected_document(
        &self,
        region: Region,
        cancel: &CancellationToken,
    ) -> Result<CorrectedDocument, ApiError> {
        self.request(
            Endpoint::get("/generate_corrected_document").query("region", region.code()),
            cancel,
        )
        .await
    }

    async fn download_corrected_document(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ApiError> {
        self.request_bytes(Endpoint::get("/download_corrected_document"), cancel)
            .await
    }

    async fn simplified_analysis(
        &self,
        region: Region,
        domain: &str,
        cancel: &CancellationToken,
    ) -> Result<SimplifiedAnalysis, ApiError> {
        let endpoint = Endpoint::get("/simplified_analysis")
            .query("region", region.code())
            .query("domain", domain);
        self.request(endpoint, cancel).await
    }
}
