use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    error::ErrorBody,
    protocol::{SubmissionPayload, SubmitAck, SUBMIT_CONSULTATION_ROUTE},
};
use thiserror::Error;
use url::Url;

pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum RelayClientError {
    #[error("invalid relay endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("relay unreachable: {0}")]
    Network(#[from] reqwest::Error),
    #[error("relay rejected submission ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Transport used by the intake controller to reach the submission relay.
#[async_trait]
pub trait RelayClient: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmitAck, RelayClientError>;
}

#[async_trait]
impl<T: RelayClient + ?Sized> RelayClient for Arc<T> {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmitAck, RelayClientError> {
        (**self).submit(payload).await
    }
}

pub struct HttpRelayClient {
    http: Client,
    endpoint: Url,
}

impl HttpRelayClient {
    /// `base_url` is the site or relay host, optionally with a path prefix.
    /// The submission route is appended under that prefix, so
    /// `https://host/api` posts to `https://host/api/submit-consultation`.
    pub fn new(base_url: &str) -> Result<Self, RelayClientError> {
        Self::with_timeout(base_url, DEFAULT_RELAY_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, RelayClientError> {
        let invalid = |reason: String| RelayClientError::InvalidEndpoint {
            endpoint: base_url.to_string(),
            reason,
        };
        let endpoint = Url::parse(base_url)
            .and_then(|mut base| {
                if !base.path().ends_with('/') {
                    let prefix = format!("{}/", base.path());
                    base.set_path(&prefix);
                }
                base.join(SUBMIT_CONSULTATION_ROUTE.trim_start_matches('/'))
            })
            .map_err(|err| invalid(err.to_string()))?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmitAck, RelayClientError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or(text);
            return Err(RelayClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        match serde_json::from_str::<SubmitAck>(&text) {
            Ok(ack) if ack.success => Ok(ack),
            _ => Err(RelayClientError::Rejected {
                status: status.as_u16(),
                message: "relay did not acknowledge the submission".to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "tests/relay_client_tests.rs"]
mod tests;
