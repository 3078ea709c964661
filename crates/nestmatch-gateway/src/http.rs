use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use nestmatch_schema::Submission;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::{SubmissionErrorKind, SubmissionGateway};

/// Posts finished surveys as JSON to `{base_url}/survey-response`.
#[derive(Debug, Clone)]
pub struct HttpSubmissionGateway {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpSubmissionGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/survey-response", self.base_url)
    }
}

#[async_trait]
impl SubmissionGateway for HttpSubmissionGateway {
    async fn submit(&self, submission: Submission) -> Result<()> {
        let url = self.endpoint();
        tracing::debug!(%url, uid = %submission.identity.uid, "posting survey responses");

        let resp = match self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&submission)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return Err(format_transport_error(
                    SubmissionErrorKind::Timeout,
                    format!("request timed out after {}s", self.timeout.as_secs()),
                ));
            }
            Err(e) if e.is_connect() => {
                return Err(format_transport_error(
                    SubmissionErrorKind::Connect,
                    e.to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let parsed = serde_json::from_str::<ApiError>(&text).ok();
            return Err(format_api_error(status, parsed));
        }

        tracing::info!(uid = %submission.identity.uid, "survey responses submitted");
        Ok(())
    }
}

/// Error body of the survey backend, `{"detail": "..."}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiError {
    pub detail: String,
}

fn format_api_error(status: StatusCode, parsed: Option<ApiError>) -> anyhow::Error {
    let retryable = SubmissionErrorKind::from_status(status).retry_hint();
    match parsed {
        Some(api_error) => anyhow!("submission error ({status}){retryable}: {}", api_error.detail),
        None => anyhow!("submission error ({status}){retryable}"),
    }
}

/// Failure before any HTTP status was received.
fn format_transport_error(kind: SubmissionErrorKind, detail: String) -> anyhow::Error {
    let label = match kind {
        SubmissionErrorKind::Timeout => "timeout",
        SubmissionErrorKind::Connect => "connect",
        _ => "transport",
    };
    anyhow!("submission error ({label}){}: {detail}", kind.retry_hint())
}
