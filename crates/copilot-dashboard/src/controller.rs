//! User-facing handlers
//!
//! A [`Dashboard`] owns the API handle, the [`Store`] and a root
//! cancellation token. Every handler issues its requests on a child of that
//! token, so [`Dashboard::shutdown`] aborts all of them at once and nothing is
//! written to the store afterwards.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use copilot_client::config::DEFAULT_POLL_INTERVAL_SECS;
use copilot_client::{ApiClient, ApiError, ComplianceApi, FilePayload};
use serde_json::Value;
use shared_types::{
    AnonymizationInfo, AnonymizationMethod, AnonymizeRequest, AnonymizeResponse,
    ComplianceFlag, CorrectedDocument, DocumentAnalysis, ExplainResult, ExtractedTable,
    NewDocument, PathwaySearchRequest, PathwaySearchResult, Region, RiskCorrelation,
    RuleDocument, RuleSummary, SimplifiedAnalysis, SystemStatus, UploadContractResponse,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::polling::LivePoller;
use crate::state::{Event, Notice, Panel, Store};

/// Number of passages requested per semantic search
pub const DEFAULT_TOP_K: usize = 5;

const SNIPPET_FILE_NAME: &str = "snippet.md";
const SNIPPET_MIME: &str = "text/markdown";

/// Input for [`Dashboard::add_rule`]. A file wins over pasted text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleInput {
    pub file: Option<PathBuf>,
    pub text: String,
}

impl RuleInput {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(path.into()),
            text: String::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            file: None,
            text: text.into(),
        }
    }
}

#[derive(Clone)]
pub struct Dashboard {
    api: Arc<dyn ComplianceApi>,
    store: Store,
    cancel: CancellationToken,
    poll_interval: Duration,
}

impl Dashboard {
    pub fn new(api: Arc<dyn ComplianceApi>) -> Self {
        Self {
            api,
            store: Store::default(),
            cancel: CancellationToken::new(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }

    /// Dashboard over the HTTP client, polling at the configured interval
    pub fn from_client(client: ApiClient) -> Self {
        let poll_interval = client.config().poll_interval;
        Self::new(Arc::new(client)).with_poll_interval(poll_interval)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn api(&self) -> &Arc<dyn ComplianceApi> {
        &self.api
    }

    /// Cancel every in-flight request and stop accepting state updates
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.store.close();
        debug!("Dashboard shut down");
    }

    fn notify(&self, notice: Notice) {
        self.store.dispatch(Event::Notify(notice));
    }

    /// Surface a user-initiated failure as an error notice
    fn notify_failure(&self, context: &str, err: &ApiError) {
        if err.is_cancelled() {
            return;
        }
        warn!(error = %err, "{}", context);
        let message = match err {
            ApiError::Validation(message) => message.clone(),
            other => format!("{}: {}", context, other),
        };
        self.notify(Notice::Error(message));
    }

    fn validation(&self, message: &str) -> ApiError {
        let err = ApiError::Validation(message.to_string());
        self.notify(Notice::Error(message.to_string()));
        err
    }

    /// Run a panel request: mark the slice loading, then store the payload or
    /// the failure message.
    async fn track<R, F>(
        &self,
        panel: Panel,
        request: F,
        loaded: impl FnOnce(R) -> Event,
    ) -> Result<R, ApiError>
    where
        R: Clone,
        F: Future<Output = Result<R, ApiError>>,
    {
        self.store.dispatch(Event::Started(panel));
        match request.await {
            Ok(value) => {
                self.store.dispatch(loaded(value.clone()));
                debug!(?panel, "Panel loaded");
                Ok(value)
            }
            Err(err) => {
                if !err.is_cancelled() {
                    warn!(?panel, error = %err, "Panel request failed");
                    self.store.dispatch(Event::Failed(panel, err.to_string()));
                }
                Err(err)
            }
        }
    }

    // Session

    pub fn set_region(&self, region: Region) {
        self.store.dispatch(Event::RegionSelected(region));
    }

    pub fn region(&self) -> Region {
        self.store.read(|s| s.session.region)
    }

    /// Remember `path` as the contract to upload next
    pub fn select_contract(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let file_name = file_name_of(&path);
        self.store
            .dispatch(Event::ContractSelected { path, file_name });
    }

    // Uploads

    pub async fn upload_contract(&self) -> Result<UploadContractResponse, ApiError> {
        let Some(contract) = self.store.read(|s| s.session.contract.clone()) else {
            return Err(self.validation("Please choose a contract PDF file first."));
        };

        let bytes = match read_file(&contract.path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                self.notify_failure("Upload error", &err);
                return Err(err);
            }
        };

        let cancel = self.cancel.child_token();
        let payload = FilePayload::new(contract.file_name.clone(), bytes);
        match self.api.upload_contract(payload, &cancel).await {
            Ok(response) => {
                for field in response.fields.iter().filter(|f| f.has_leaked_representation()) {
                    warn!(
                        field = %field.name,
                        "Extracted value carries a serialized markdown representation"
                    );
                }
                info!(
                    file = %contract.file_name,
                    fields = response.fields.len(),
                    "Contract uploaded"
                );
                self.store
                    .dispatch(Event::ContractUploaded(response.fields.clone()));
                self.notify(Notice::Info(format!(
                    "Contract uploaded successfully! Extracted {} fields.",
                    response.fields.len()
                )));
                Ok(response)
            }
            Err(err) => {
                self.notify_failure("Upload failed", &err);
                Err(err)
            }
        }
    }

    pub async fn add_rule(&self, input: RuleInput) -> Result<(), ApiError> {
        let payload = match (&input.file, input.text.trim().is_empty()) {
            (Some(path), _) => match read_file(path).await {
                Ok(bytes) => FilePayload::new(file_name_of(path), bytes),
                Err(err) => {
                    self.notify_failure("Add rule error", &err);
                    return Err(err);
                }
            },
            (None, false) => FilePayload::new(SNIPPET_FILE_NAME, input.text.into_bytes())
                .with_mime(SNIPPET_MIME),
            (None, true) => {
                return Err(self.validation("Please provide either a rule file or paste rule text."))
            }
        };

        let cancel = self.cancel.child_token();
        let file_name = payload.file_name.clone();
        match self.api.upload_rule(payload, &cancel).await {
            Ok(_) => {
                info!(file = %file_name, "Rule added");
                self.notify(Notice::Info("Rule added successfully!".to_string()));
                self.refresh_rules().await;
                Ok(())
            }
            Err(err) => {
                self.notify_failure("Add rule failed", &err);
                Err(err)
            }
        }
    }

    // Rule editor

    /// Reload the rule list. Failures are logged and leave the list as is.
    pub async fn refresh_rules(&self) -> Vec<RuleSummary> {
        let cancel = self.cancel.child_token();
        match self.api.list_rules(&cancel).await {
            Ok(list) => {
                self.store.dispatch(Event::RulesLoaded(list.items.clone()));
                list.items
            }
            Err(err) => {
                if !err.is_cancelled() {
                    warn!(error = %err, "Could not refresh rules");
                }
                self.store.read(|s| s.rules.items.clone())
            }
        }
    }

    pub async fn load_rule(&self, name: &str) -> Result<RuleDocument, ApiError> {
        let cancel = self.cancel.child_token();
        match self.api.get_rule(name, &cancel).await {
            Ok(rule) => {
                self.store.dispatch(Event::EditorChanged(rule.clone()));
                Ok(rule)
            }
            Err(err) => {
                self.notify_failure("Load failed", &err);
                Err(err)
            }
        }
    }

    /// Replace the editor buffer
    pub fn set_editor(&self, name: impl Into<String>, text: impl Into<String>) {
        self.store.dispatch(Event::EditorChanged(RuleDocument {
            name: name.into(),
            text: text.into(),
        }));
    }

    /// Save the editor buffer, then reload the list from the server
    pub async fn save_rule(&self) -> Result<(), ApiError> {
        let rule = self.store.read(|s| s.rules.editor.clone());
        let cancel = self.cancel.child_token();
        match self.api.save_rule(&rule, &cancel).await {
            Ok(_) => {
                info!(name = %rule.name, "Rule saved");
                self.notify(Notice::Info("Rule saved".to_string()));
                self.refresh_rules().await;
                Ok(())
            }
            Err(err) => {
                self.notify_failure("Save failed", &err);
                Err(err)
            }
        }
    }

    // Compliance check and explain

    /// Upload the selected contract if it is still pending, then run the
    /// check for the current region.
    pub async fn check_compliance(&self) -> Result<Vec<ComplianceFlag>, ApiError> {
        if self.store.read(|s| s.pending_contract().is_some()) {
            self.upload_contract().await?;
        }

        let region = self.region();
        let cancel = self.cancel.child_token();
        let flags = self
            .track(Panel::Flags, self.api.check(region, &cancel), Event::FlagsLoaded)
            .await;

        match flags {
            Ok(flags) => {
                info!(region = %region, flags = flags.len(), "Compliance check finished");
                let message = if flags.is_empty() {
                    "No compliance issues found for the selected region!".to_string()
                } else {
                    format!("Found {} compliance issue(s).", flags.len())
                };
                self.notify(Notice::Info(message));
                Ok(flags)
            }
            Err(err) => {
                self.notify_failure("Compliance check failed", &err);
                Err(err)
            }
        }
    }

    /// Open the explain modal for `flag_id`.
    ///
    /// The modal enters its loading state before this returns, so callers can
    /// render it while the returned future is still pending.
    pub fn explain(
        &self,
        flag_id: impl Into<String>,
    ) -> impl Future<Output = Result<ExplainResult, ApiError>> + Send + '_ {
        let flag_id = flag_id.into();
        let region = self.region();
        self.store.dispatch(Event::ExplainRequested(flag_id.clone()));

        async move {
            let cancel = self.cancel.child_token();
            let result = self.api.explain(&flag_id, region, &cancel).await;
            match &result {
                Ok(explanation) => {
                    self.store.dispatch(Event::ExplainLoaded {
                        flag_id,
                        result: explanation.clone(),
                    });
                }
                Err(ApiError::Cancelled) => {}
                Err(err) => {
                    let message = match err {
                        ApiError::Malformed { .. } => "Invalid response format".to_string(),
                        ApiError::Http { .. } => format!("Failed to get explanation: {}", err),
                        other => other.to_string(),
                    };
                    warn!(flag_id = %flag_id, error = %err, "Explain failed");
                    self.store.dispatch(Event::ExplainFailed {
                        flag_id,
                        message,
                        raw: err.raw_body().map(str::to_string),
                    });
                }
            }
            result
        }
    }

    pub fn close_explain(&self) {
        self.store.dispatch(Event::ExplainClosed);
    }

    // Derived analyses

    pub async fn analyze_risk_correlation(&self) -> Result<Vec<RiskCorrelation>, ApiError> {
        let cancel = self.cancel.child_token();
        let region = self.region();
        let request = async {
            self.api
                .risk_correlation(region, &cancel)
                .await
                .map(|r| r.correlations)
        };
        self.track(Panel::Correlations, request, Event::CorrelationsLoaded)
            .await
    }

    pub async fn extract_tables(&self) -> Result<Vec<ExtractedTable>, ApiError> {
        let cancel = self.cancel.child_token();
        let request = async { self.api.extract_tables(&cancel).await.map(|r| r.tables) };
        self.track(Panel::Tables, request, Event::TablesLoaded).await
    }

    pub async fn check_system_status(&self) -> Result<SystemStatus, ApiError> {
        let cancel = self.cancel.child_token();
        self.track(
            Panel::SystemStatus,
            self.api.system_status(&cancel),
            Event::SystemStatusLoaded,
        )
        .await
    }

    pub async fn simplified_analysis(&self, domain: &str) -> Result<SimplifiedAnalysis, ApiError> {
        let cancel = self.cancel.child_token();
        let region = self.region();
        self.track(
            Panel::Simplified,
            self.api.simplified_analysis(region, domain, &cancel),
            Event::SimplifiedLoaded,
        )
        .await
    }

    pub async fn analyze_document(&self) -> Result<DocumentAnalysis, ApiError> {
        let cancel = self.cancel.child_token();
        let region = self.region();
        self.track(
            Panel::DocumentAnalysis,
            self.api.analyze_document(region, &cancel),
            Event::DocumentAnalysisLoaded,
        )
        .await
    }

    pub async fn generate_corrected_document(&self) -> Result<CorrectedDocument, ApiError> {
        let cancel = self.cancel.child_token();
        let region = self.region();
        self.track(
            Panel::CorrectedDocument,
            self.api.generate_corrected_document(region, &cancel),
            Event::CorrectedDocumentLoaded,
        )
        .await
    }

    /// Raw bytes of the last generated corrected document
    pub async fn download_corrected_document(&self) -> Result<Vec<u8>, ApiError> {
        let cancel = self.cancel.child_token();
        let result = self.api.download_corrected_document(&cancel).await;
        if let Err(err) = &result {
            self.notify_failure("Download failed", err);
        }
        result
    }

    pub async fn anonymization_info(&self) -> Result<AnonymizationInfo, ApiError> {
        let cancel = self.cancel.child_token();
        self.track(
            Panel::Anonymization,
            self.api.anonymization_info(&cancel),
            Event::AnonymizationInfoLoaded,
        )
        .await
    }

    /// Anonymize the flags currently on screen
    pub async fn anonymize(&self, method: AnonymizationMethod) -> Result<AnonymizeResponse, ApiError> {
        let request = AnonymizeRequest {
            data: self.store.read(|s| s.flags.data.clone()),
            method,
        };
        let cancel = self.cancel.child_token();
        self.track(
            Panel::Anonymized,
            self.api.anonymize(&request, &cancel),
            Event::AnonymizedLoaded,
        )
        .await
    }

    // Pathway

    pub async fn pathway_search(&self, query: &str) -> Result<Vec<PathwaySearchResult>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(self.validation("Please enter a search query"));
        }

        let request = PathwaySearchRequest {
            query: query.to_string(),
            top_k: DEFAULT_TOP_K,
        };
        let cancel = self.cancel.child_token();
        let search = async {
            self.api
                .pathway_search(&request, &cancel)
                .await
                .map(|r| r.results)
        };

        match self
            .track(Panel::PathwaySearch, search, Event::SearchResultsLoaded)
            .await
        {
            Ok(results) => {
                self.notify(Notice::Info(format!(
                    "Found {} relevant documents.",
                    results.len()
                )));
                Ok(results)
            }
            Err(err) => {
                self.notify_failure("Pathway search failed", &err);
                Err(err)
            }
        }
    }

    /// Fetch stats and store them; failures are only logged
    pub async fn refresh_pathway_stats(&self) {
        let cancel = self.cancel.child_token();
        match self.api.pathway_stats(&cancel).await {
            Ok(stats) => {
                self.store.dispatch(Event::PathwayStatsLoaded(stats));
            }
            Err(err) if err.is_cancelled() => {}
            Err(err) => warn!(error = %err, "Could not load pathway stats"),
        }
    }

    /// Fetch the activity feed and store it; failures are only logged
    pub async fn refresh_live_activity(&self) {
        let cancel = self.cancel.child_token();
        match self.api.live_activity(&cancel).await {
            Ok(response) => {
                self.store
                    .dispatch(Event::LiveActivityLoaded(response.activities));
            }
            Err(err) if err.is_cancelled() => {}
            Err(err) => warn!(error = %err, "Could not load live activity"),
        }
    }

    /// Index a new document, then refresh stats and activity
    pub async fn add_document(&self, document: NewDocument) -> Result<Value, ApiError> {
        if document.content.trim().is_empty() || document.name.trim().is_empty() {
            return Err(self.validation("Please provide both content and filename"));
        }

        let cancel = self.cancel.child_token();
        match self.api.add_document(&document, &cancel).await {
            Ok(response) => {
                info!(name = %document.name, "Document added to pathway index");
                let detail = response
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Document added successfully!");
                self.notify(Notice::Info(detail.to_string()));
                tokio::join!(self.refresh_pathway_stats(), self.refresh_live_activity());
                Ok(response)
            }
            Err(err) => {
                self.notify_failure("Failed to add document", &err);
                Err(err)
            }
        }
    }

    /// Start background refresh of stats and activity. The poller is tied to
    /// this dashboard's lifetime.
    pub fn start_live_polling(&self) -> LivePoller {
        LivePoller::spawn(
            Arc::clone(&self.api),
            self.store.clone(),
            self.poll_interval,
            self.cancel.child_token(),
        )
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

async fn read_file(path: &Path) -> Result<Vec<u8>, ApiError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::Validation(format!("Could not read {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_of() {
        assert_eq!(file_name_of(Path::new("/tmp/contracts/nda.pdf")), "nda.pdf");
        assert_eq!(file_name_of(Path::new("msa.pdf")), "msa.pdf");
    }

    #[test]
    fn test_rule_input_constructors() {
        assert_eq!(RuleInput::text("x").file, None);
        assert_eq!(
            RuleInput::file("/tmp/gdpr.md").file,
            Some(PathBuf::from("/tmp/gdpr.md"))
        );
        assert_eq!(RuleInput::default().text, "");
    }
}
