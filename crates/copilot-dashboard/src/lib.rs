//! Compliance Copilot dashboard
//!
//! The dashboard is the client's view/controller layer:
//!
//! - [`state`]: one explicit [`AppState`] with a named slice per concern,
//!   mutated only through [`AppState::apply`]
//! - [`controller`]: one handler per user action, each calling the backend and
//!   dispatching completion events
//! - [`polling`]: the live Pathway refresh loop
//! - [`export`]: JSON/CSV serialization of the current flags
//! - [`render`]: plain-text presentation of every panel

pub mod controller;
pub mod export;
pub mod polling;
pub mod render;
pub mod state;

pub use controller::{Dashboard, RuleInput};
pub use export::{export_file_name, flags_to_csv, flags_to_json, write_export, ExportFormat};
pub use polling::{LivePoller, PollDiagnostics};
pub use state::{
    AppState, Event, ExplainModal, ExplainStatus, Notice, Panel, RiskCounts, SelectedContract,
    Slice, Store,
};
