//! Application state and its reducer
//!
//! Every panel owns a named slice of [`AppState`]. Handlers never touch the
//! state directly: they dispatch [`Event`]s through the [`Store`], and
//! [`AppState::apply`] performs the transition. Payloads replace their slice
//! wholesale.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use shared_types::{
    AnonymizationInfo, AnonymizeResponse, ComplianceFlag, ContractField, CorrectedDocument,
    DocumentAnalysis, ExplainResult, ExtractedTable, LiveActivity, PathwaySearchResult,
    PathwayStats, Region, RiskCorrelation, RiskLevel, RuleDocument, RuleSummary,
    SimplifiedAnalysis, SystemStatus,
};
use tracing::debug;

/// Editor buffer name before any rule is loaded
pub const DEFAULT_RULE_NAME: &str = "new_rule.md";

/// A contract chosen by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedContract {
    pub path: PathBuf,
    pub file_name: String,
    /// False until `/upload_contract` has accepted this exact selection
    pub uploaded: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub region: Region,
    pub contract: Option<SelectedContract>,
}

/// Data for one panel plus its in-flight and failure markers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slice<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Slice<T> {
    fn start(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }

    fn replace(&mut self, data: T) {
        self.data = data;
        self.loading = false;
        self.error = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RulesState {
    pub items: Vec<RuleSummary>,
    pub editor: RuleDocument,
}

impl Default for RulesState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            editor: RuleDocument {
                name: DEFAULT_RULE_NAME.to_string(),
                text: String::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExplainStatus {
    Loading,
    Populated(ExplainResult),
    Failed {
        message: String,
        /// Body text when the response was not valid JSON
        raw: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ExplainModal {
    #[default]
    Closed,
    Open {
        flag_id: String,
        status: ExplainStatus,
    },
}

impl ExplainModal {
    pub fn is_open(&self) -> bool {
        matches!(self, ExplainModal::Open { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            ExplainModal::Open {
                status: ExplainStatus::Loading,
                ..
            }
        )
    }

    fn is_loading_for(&self, id: &str) -> bool {
        matches!(
            self,
            ExplainModal::Open { flag_id, status: ExplainStatus::Loading } if flag_id == id
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathwayState {
    pub stats: Option<PathwayStats>,
    pub activity: Vec<LiveActivity>,
    pub search: Slice<Vec<PathwaySearchResult>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisState {
    pub simplified: Slice<Option<SimplifiedAnalysis>>,
    pub document: Slice<Option<DocumentAnalysis>>,
    pub corrected: Slice<Option<CorrectedDocument>>,
    pub anonymization: Slice<Option<AnonymizationInfo>>,
    pub anonymized: Slice<Option<AnonymizeResponse>>,
}

/// Inline banner shown after user-initiated actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Panels whose loading/error markers are driven by `Started`/`Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Flags,
    Correlations,
    Tables,
    SystemStatus,
    PathwaySearch,
    Simplified,
    DocumentAnalysis,
    CorrectedDocument,
    Anonymization,
    Anonymized,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RegionSelected(Region),
    ContractSelected { path: PathBuf, file_name: String },
    ContractUploaded(Vec<ContractField>),
    Started(Panel),
    Failed(Panel, String),
    FlagsLoaded(Vec<ComplianceFlag>),
    RulesLoaded(Vec<RuleSummary>),
    EditorChanged(RuleDocument),
    ExplainRequested(String),
    ExplainLoaded { flag_id: String, result: ExplainResult },
    ExplainFailed {
        flag_id: String,
        message: String,
        raw: Option<String>,
    },
    ExplainClosed,
    CorrelationsLoaded(Vec<RiskCorrelation>),
    TablesLoaded(Vec<ExtractedTable>),
    SystemStatusLoaded(SystemStatus),
    SearchResultsLoaded(Vec<PathwaySearchResult>),
    PathwayStatsLoaded(PathwayStats),
    LiveActivityLoaded(Vec<LiveActivity>),
    SimplifiedLoaded(SimplifiedAnalysis),
    DocumentAnalysisLoaded(DocumentAnalysis),
    CorrectedDocumentLoaded(CorrectedDocument),
    AnonymizationInfoLoaded(AnonymizationInfo),
    AnonymizedLoaded(AnonymizeResponse),
    Notify(Notice),
    NoticeDismissed,
}

/// Counts shown in the stats grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskCounts {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl RiskCounts {
    pub fn from_levels<'a>(levels: impl IntoIterator<Item = &'a RiskLevel>) -> Self {
        let mut counts = RiskCounts::default();
        for level in levels {
            counts.total += 1;
            match level {
                RiskLevel::High => counts.high += 1,
                RiskLevel::Medium => counts.medium += 1,
                RiskLevel::Low => counts.low += 1,
                RiskLevel::Unknown(_) => {}
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub session: Session,
    pub extracted_fields: Vec<ContractField>,
    pub flags: Slice<Vec<ComplianceFlag>>,
    pub rules: RulesState,
    pub explain: ExplainModal,
    pub correlations: Slice<Vec<RiskCorrelation>>,
    pub tables: Slice<Vec<ExtractedTable>>,
    pub system_status: Slice<Option<SystemStatus>>,
    pub pathway: PathwayState,
    pub analysis: AnalysisState,
    pub notice: Option<Notice>,
}

impl AppState {
    pub fn flag_counts(&self) -> RiskCounts {
        RiskCounts::from_levels(self.flags.data.iter().map(|f| &f.risk_level))
    }

    /// The selected contract if it still needs uploading
    pub fn pending_contract(&self) -> Option<&SelectedContract> {
        self.session.contract.as_ref().filter(|c| !c.uploaded)
    }

    /// Apply one transition
    pub fn apply(&mut self, event: Event) {
        match event {
            Event::RegionSelected(region) => self.session.region = region,
            Event::ContractSelected { path, file_name } => {
                self.session.contract = Some(SelectedContract {
                    path,
                    file_name,
                    uploaded: false,
                });
            }
            Event::ContractUploaded(fields) => {
                if let Some(contract) = self.session.contract.as_mut() {
                    contract.uploaded = true;
                }
                self.extracted_fields = fields;
            }
            Event::Started(panel) => self.with_panel(panel, PanelOp::Start),
            Event::Failed(panel, message) => self.with_panel(panel, PanelOp::Fail(message)),
            Event::FlagsLoaded(flags) => self.flags.replace(flags),
            Event::RulesLoaded(items) => self.rules.items = items,
            Event::EditorChanged(rule) => self.rules.editor = rule,
            Event::ExplainRequested(flag_id) => {
                self.explain = ExplainModal::Open {
                    flag_id,
                    status: ExplainStatus::Loading,
                };
            }
            Event::ExplainLoaded { flag_id, result } => {
                if self.explain.is_loading_for(&flag_id) {
                    self.explain = ExplainModal::Open {
                        flag_id,
                        status: ExplainStatus::Populated(result),
                    };
                } else {
                    debug!(flag_id = %flag_id, "Discarding stale explanation");
                }
            }
            Event::ExplainFailed {
                flag_id,
                message,
                raw,
            } => {
                if self.explain.is_loading_for(&flag_id) {
                    self.explain = ExplainModal::Open {
                        flag_id,
                        status: ExplainStatus::Failed { message, raw },
                    };
                } else {
                    debug!(flag_id = %flag_id, "Discarding stale explanation failure");
                }
            }
            Event::ExplainClosed => self.explain = ExplainModal::Closed,
            Event::CorrelationsLoaded(correlations) => self.correlations.replace(correlations),
            Event::TablesLoaded(tables) => self.tables.replace(tables),
            Event::SystemStatusLoaded(status) => self.system_status.replace(Some(status)),
            Event::SearchResultsLoaded(results) => self.pathway.search.replace(results),
            Event::PathwayStatsLoaded(stats) => self.pathway.stats = Some(stats),
            Event::LiveActivityLoaded(activity) => self.pathway.activity = activity,
            Event::SimplifiedLoaded(analysis) => self.analysis.simplified.replace(Some(analysis)),
            Event::DocumentAnalysisLoaded(analysis) => {
                self.analysis.document.replace(Some(analysis))
            }
            Event::CorrectedDocumentLoaded(document) => {
                self.analysis.corrected.replace(Some(document))
            }
            Event::AnonymizationInfoLoaded(info) => {
                self.analysis.anonymization.replace(Some(info))
            }
            Event::AnonymizedLoaded(response) => self.analysis.anonymized.replace(Some(response)),
            Event::Notify(notice) => self.notice = Some(notice),
            Event::NoticeDismissed => self.notice = None,
        }
    }

    fn with_panel(&mut self, panel: Panel, op: PanelOp) {
        match panel {
            Panel::Flags => op.run(&mut self.flags),
            Panel::Correlations => op.run(&mut self.correlations),
            Panel::Tables => op.run(&mut self.tables),
            Panel::SystemStatus => op.run(&mut self.system_status),
            Panel::PathwaySearch => op.run(&mut self.pathway.search),
            Panel::Simplified => op.run(&mut self.analysis.simplified),
            Panel::DocumentAnalysis => op.run(&mut self.analysis.document),
            Panel::CorrectedDocument => op.run(&mut self.analysis.corrected),
            Panel::Anonymization => op.run(&mut self.analysis.anonymization),
            Panel::Anonymized => op.run(&mut self.analysis.anonymized),
        }
    }
}

enum PanelOp {
    Start,
    Fail(String),
}

impl PanelOp {
    fn run<T>(self, slice: &mut Slice<T>) {
        match self {
            PanelOp::Start => slice.start(),
            PanelOp::Fail(message) => slice.fail(message),
        }
    }
}

struct StoreInner {
    state: AppState,
    closed: bool,
}

/// Shared handle to the dashboard state.
///
/// The lock is only held for the duration of a single `apply`, never across
/// an await. Once closed, dispatches are dropped.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<StoreInner>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                state,
                closed: false,
            })),
        }
    }

    /// Apply `event`; returns false if the store was already closed
    pub fn dispatch(&self, event: Event) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.closed {
            debug!(?event, "Store closed, dropping event");
            return false;
        }
        inner.state.apply(event);
        true
    }

    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&inner.state)
    }

    pub fn snapshot(&self) -> AppState {
        self.read(AppState::clone)
    }

    pub fn close(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }
}
