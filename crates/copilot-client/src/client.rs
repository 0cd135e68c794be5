//! The typed-request helper
//!
//! Each endpoint is described by an [`Endpoint`] (method, path, query, body)
//! and executed by [`ApiClient::request`], which owns status checking, error
//! body parsing, text-then-JSON decoding and cancellation. Endpoint methods in
//! [`crate::api`] only pick the path and the result type.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// A file to send as the multipart `file` field
#[derive(Debug, Clone, PartialEq)]
pub struct FilePayload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Explicit content type; reqwest guesses nothing when absent
    pub mime: Option<String>,
}

impl FilePayload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    fn into_form(self) -> Result<Form, ApiError> {
        let mut part = Part::bytes(self.bytes).file_name(self.file_name);
        if let Some(mime) = self.mime {
            part = part
                .mime_str(&mime)
                .map_err(|e| ApiError::Validation(format!("Invalid content type '{}': {}", mime, e)))?;
        }
        Ok(Form::new().part("file", part))
    }
}

/// Request body variants the backend accepts
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    File(FilePayload),
}

/// One backend call: method, path, query string and body
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub method: Method,
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
    pub body: Body,
}

impl Endpoint {
    pub fn get(path: &'static str) -> Self {
        Self {
            method: Method::GET,
            path,
            query: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn post(path: &'static str) -> Self {
        Self {
            method: Method::POST,
            path,
            query: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Validation(format!("Could not encode request body: {}", e)))?;
        self.body = Body::Json(value);
        Ok(self)
    }

    pub fn file(mut self, payload: FilePayload) -> Self {
        self.body = Body::File(payload);
        self
    }
}

/// HTTP client bound to one backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Execute `endpoint` and decode the body as `T`.
    ///
    /// The body is read as text first so a shape mismatch surfaces as
    /// [`ApiError::Malformed`] carrying the raw text instead of a bare decode
    /// error.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError> {
        let bytes = self.request_bytes(endpoint, cancel).await?;
        let raw = String::from_utf8_lossy(&bytes).into_owned();
        serde_json::from_str(&raw).map_err(|e| ApiError::Malformed {
            reason: e.to_string(),
            raw,
        })
    }

    /// Execute `endpoint` and return the raw body of a 2xx response
    pub async fn request_bytes(
        &self,
        endpoint: Endpoint,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ApiError> {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        let mut url = self.config.endpoint_url(endpoint.path);
        if !endpoint.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(endpoint.query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        debug!(method = %endpoint.method, url = %url, "Sending request");

        let mut builder = self.http.request(endpoint.method.clone(), url);
        builder = match endpoint.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::File(payload) => builder.multipart(payload.into_form()?),
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            result = builder.send() => result?,
        };

        let status = response.status();
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            result = response.bytes() => result?,
        };

        debug!(
            method = %endpoint.method,
            path = endpoint.path,
            status = status.as_u16(),
            bytes = body.len(),
            "Response received"
        );

        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }

        Ok(body.to_vec())
    }
}
