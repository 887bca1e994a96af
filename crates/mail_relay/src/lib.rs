use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::ConsultationRequest,
    protocol::{SubmissionPayload, SubmitAck},
};
use tracing::{error, info, warn};

mod compose;
mod error;
pub mod oauth;
pub mod template;

pub use compose::{
    compose_message, ComposedMessage, MISSING_DETAILS_PLACEHOLDER, MISSING_FIELD_PLACEHOLDER,
};
pub use error::RelayError;
pub use oauth::{OAuthConfig, OAuthMailer};
pub use template::{TemplateConfig, TemplateMailer};

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

/// Delivery strategy for composed consultation messages.
#[async_trait]
pub trait MailBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(
        &self,
        request: &ConsultationRequest,
        message: &ComposedMessage,
    ) -> Result<(), RelayError>;
}

/// Backend selection, resolved from configuration at startup.
#[derive(Debug, Clone)]
pub enum MailerConfig {
    OAuth(OAuthConfig),
    Template(TemplateConfig),
}

pub fn http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}

pub fn build_backend(
    config: MailerConfig,
    timeout: Duration,
) -> reqwest::Result<Arc<dyn MailBackend>> {
    let http = http_client(timeout)?;
    let backend: Arc<dyn MailBackend> = match config {
        MailerConfig::OAuth(config) => Arc::new(OAuthMailer::new(config, http)),
        MailerConfig::Template(config) => Arc::new(TemplateMailer::new(config, http)),
    };
    Ok(backend)
}

/// Validates consultation submissions and hands them to a [`MailBackend`].
///
/// Each call makes exactly one delivery attempt. Provider details stay in the
/// logs; callers only see the [`RelayError`] variant.
#[derive(Clone)]
pub struct Relay {
    backend: Arc<dyn MailBackend>,
}

impl Relay {
    pub fn new(backend: Arc<dyn MailBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn send_consultation_email(
        &self,
        payload: SubmissionPayload,
    ) -> Result<SubmitAck, RelayError> {
        let request = ConsultationRequest::try_from(payload).map_err(|missing| {
            warn!(fields = %missing.field_list(), "rejecting consultation with missing fields");
            RelayError::from(missing)
        })?;

        let message = compose_message(&request);
        match self.backend.deliver(&request, &message).await {
            Ok(()) => {
                info!(backend = self.backend.name(), "consultation request delivered");
                Ok(SubmitAck::accepted())
            }
            Err(err) => {
                error!(backend = self.backend.name(), %err, "consultation delivery failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
