pub mod http;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use nestmatch_schema::Submission;
use serde::{Deserialize, Serialize};

pub use http::HttpSubmissionGateway;

/// Ships a finished survey to whatever stores and scores it.
///
/// Callers fire this once per completed session and do not wait on it:
/// a failed submission is reported but never rolls the session back.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn submit(&self, submission: Submission) -> Result<()>;
}

/// Drops submissions after logging them. Used when no endpoint is configured.
#[derive(Debug, Clone, Default)]
pub struct NoopGateway;

#[async_trait]
impl SubmissionGateway for NoopGateway {
    async fn submit(&self, submission: Submission) -> Result<()> {
        tracing::info!(
            uid = %submission.identity.uid,
            answers = submission.responses.len(),
            "submission gateway disabled, dropping survey responses"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionErrorKind {
    RateLimit,
    ServerError,
    Timeout,
    /// The backend could not be reached at all.
    Connect,
    AuthError,
    InvalidRequest,
    NotFound,
    Unknown,
}

impl SubmissionErrorKind {
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            429 => Self::RateLimit,
            401 | 403 => Self::AuthError,
            404 => Self::NotFound,
            400 | 422 => Self::InvalidRequest,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::ServerError | Self::Timeout | Self::Connect
        )
    }

    /// `" [retryable]"` for retryable kinds, empty otherwise.
    pub fn retry_hint(&self) -> &'static str {
        if self.is_retryable() {
            " [retryable]"
        } else {
            ""
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Where and how finished surveys are submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the survey backend, e.g. `http://localhost:8000`.
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SubmissionConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            enabled: true,
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Create a gateway from configuration.
pub fn create_gateway(config: &SubmissionConfig) -> Result<Arc<dyn SubmissionGateway>> {
    if !config.enabled {
        return Ok(Arc::new(NoopGateway));
    }
    if config.base_url.trim().is_empty() {
        return Err(anyhow!("submission gateway requires base_url when enabled"));
    }
    Ok(Arc::new(HttpSubmissionGateway::new(
        config.base_url.clone(),
        std::time::Duration::from_secs(config.timeout_secs),
    )))
}
