//! Template-based delivery through a hosted email SDK endpoint (EmailJS):
//! the request fields travel as template variables next to the service,
//! template and public key identifiers.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use shared::domain::ConsultationRequest;
use tracing::error;

use crate::{
    compose::or_placeholder,
    error::{transport_error, UpstreamStage},
    ComposedMessage, MailBackend, RelayError, MISSING_DETAILS_PLACEHOLDER,
    MISSING_FIELD_PLACEHOLDER,
};

pub const DEFAULT_SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

#[derive(Debug, Clone)]
pub struct TemplateConfig {
    pub send_url: String,
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

#[derive(Debug, Serialize)]
struct TemplateSendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateParams<'a> {
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    phone: &'a str,
    address: &'a str,
    details: &'a str,
    subject: &'a str,
    message: &'a str,
}

pub struct TemplateMailer {
    http: Client,
    config: TemplateConfig,
}

impl TemplateMailer {
    pub fn new(config: TemplateConfig, http: Client) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl MailBackend for TemplateMailer {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn deliver(
        &self,
        request: &ConsultationRequest,
        message: &ComposedMessage,
    ) -> Result<(), RelayError> {
        let payload = TemplateSendRequest {
            service_id: &self.config.service_id,
            template_id: &self.config.template_id,
            user_id: &self.config.public_key,
            template_params: TemplateParams {
                first_name: &request.first_name,
                last_name: &request.last_name,
                email: &request.email,
                phone: or_placeholder(&request.phone, MISSING_FIELD_PLACEHOLDER),
                address: or_placeholder(&request.address, MISSING_FIELD_PLACEHOLDER),
                details: or_placeholder(&request.details, MISSING_DETAILS_PLACEHOLDER),
                subject: &message.subject,
                message: &message.body,
            },
        };

        let response = self
            .http
            .post(&self.config.send_url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| transport_error(UpstreamStage::Send, err))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        error!(%status, body = %text, "template endpoint rejected the message");
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RelayError::Authentication(
                format!("template endpoint refused credentials: {status}"),
            )),
            _ => Err(RelayError::UpstreamSend(format!(
                "template endpoint returned {status}"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "tests/template_tests.rs"]
mod tests;
