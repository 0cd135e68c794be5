//! Compliance Copilot API client
//!
//! A thin, typed layer over the backend's REST endpoints:
//!
//! - [`ClientConfig`] resolves the base URL and timeouts from the environment
//! - [`ApiClient::request`] is the single typed-request helper every endpoint
//!   goes through
//! - [`ApiError`] classifies failures as validation, HTTP, transport,
//!   malformed-body or cancellation
//! - [`ComplianceApi`] is the seam the dashboard is written against
//!
//! Every call takes a [`CancellationToken`]; cancelling it aborts the request
//! and yields [`ApiError::Cancelled`].

pub mod api;
pub mod client;
pub mod config;
pub mod error;

pub use api::ComplianceApi;
pub use client::{ApiClient, Body, Endpoint, FilePayload};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ErrorKind};
pub use tokio_util::sync::CancellationToken;
