//! KubeGraf REST API client
//!
//! Typed access to the backend's resource list, YAML and mutation endpoints.
//! Payloads are decoded and validated here so the rest of the console only
//! ever sees explicit result types.

mod client;

pub use client::{ApiClient, DEFAULT_BASE_URL};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the KubeGraf backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connection refused, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status
    #[error("API error {status}: {body}")]
    StatusError { status: u16, body: String },

    /// The response body was not what the endpoint promises
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The backend processed the request but reported `success: false`
    #[error("{0}")]
    Rejected(String),

    /// The action isn't available for this resource kind
    #[error("{action} is not supported for {kind}")]
    Unsupported {
        action: &'static str,
        kind: &'static str,
    },
}

/// `{success, error?}` envelope returned by mutation endpoints
#[derive(Debug, Deserialize)]
struct MutationResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

impl MutationResponse {
    fn into_result(self, fallback: &str) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Rejected(
                self.error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }
}

/// `{yaml}` envelope returned by most YAML endpoints
#[derive(Debug, Deserialize)]
struct YamlResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    yaml: Option<String>,
    #[serde(default)]
    error: Option<String>,
}
