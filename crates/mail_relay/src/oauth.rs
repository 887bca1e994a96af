//! Refresh-token OAuth exchange followed by a transactional "send message"
//! call, as used by Zoho Mail.

use std::fmt;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::domain::ConsultationRequest;
use tracing::{debug, error};

use crate::{
    error::{transport_error, UpstreamStage},
    ComposedMessage, MailBackend, RelayError,
};

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.zohocloud.ca/oauth/v2/token";
pub const DEFAULT_SEND_URL: &str = "https://mail.zohoapis.ca/api/accounts/self/messages";

#[derive(Clone)]
pub struct OAuthConfig {
    pub token_url: String,
    pub send_url: String,
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
    /// Mailbox the message is sent from and delivered to.
    pub sender_address: String,
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("token_url", &self.token_url)
            .field("send_url", &self.send_url)
            .field("refresh_token", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("sender_address", &self.sender_address)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    refresh_token: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest<'a> {
    from_address: &'a str,
    to_address: &'a str,
    subject: &'a str,
    content: &'a str,
    ask_receipt: &'static str,
}

pub struct OAuthMailer {
    http: Client,
    config: OAuthConfig,
}

impl OAuthMailer {
    pub fn new(config: OAuthConfig, http: Client) -> Self {
        Self { http, config }
    }

    async fn access_token(&self) -> Result<String, RelayError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&TokenRequest {
                refresh_token: &self.config.refresh_token,
                client_id: &self.config.client_id,
                client_secret: &self.config.client_secret,
                grant_type: "refresh_token",
            })
            .send()
            .await
            .map_err(|err| transport_error(UpstreamStage::Authenticate, err))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| transport_error(UpstreamStage::Authenticate, err))?;
        let parsed = serde_json::from_str::<TokenResponse>(&text).ok();

        match parsed {
            Some(TokenResponse {
                access_token: Some(token),
                ..
            }) if status.is_success() && !token.is_empty() => Ok(token),
            Some(TokenResponse { error, .. }) => {
                let reason = error.unwrap_or_else(|| "no access_token in response".to_string());
                error!(%status, %reason, "token exchange rejected");
                Err(RelayError::Authentication(format!("{status}: {reason}")))
            }
            None => {
                error!(%status, body = %text, "token endpoint returned a non-JSON body");
                Err(RelayError::Authentication(format!(
                    "{status}: unreadable token response"
                )))
            }
        }
    }
}

#[async_trait]
impl MailBackend for OAuthMailer {
    fn name(&self) -> &'static str {
        "oauth"
    }

    async fn deliver(
        &self,
        _request: &ConsultationRequest,
        message: &ComposedMessage,
    ) -> Result<(), RelayError> {
        let token = self.access_token().await?;
        debug!("obtained provider access token");

        let response = self
            .http
            .post(&self.config.send_url)
            .header(header::AUTHORIZATION, format!("Zoho-oauthtoken {token}"))
            .json(&SendMessageRequest {
                from_address: &self.config.sender_address,
                to_address: &self.config.sender_address,
                subject: &message.subject,
                content: &message.body,
                ask_receipt: "yes",
            })
            .send()
            .await
            .map_err(|err| transport_error(UpstreamStage::Send, err))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| transport_error(UpstreamStage::Send, err))?;

        if !status.is_success() {
            error!(%status, body = %text, "send endpoint rejected the message");
            return Err(RelayError::UpstreamSend(format!("send endpoint returned {status}")));
        }

        let body: Value = serde_json::from_str(&text).map_err(|err| {
            error!(%status, body = %text, "send endpoint returned a non-JSON body");
            RelayError::UpstreamSend(format!("unreadable send response: {err}"))
        })?;
        if send_rejected(&body) {
            error!(body = %text, "send endpoint reported a failure status");
            return Err(RelayError::UpstreamSend(
                "provider reported a failure status".to_string(),
            ));
        }
        Ok(())
    }
}

/// The provider answers 200 with `status.code` describing the outcome; a
/// non-200 code is only a failure when `data.code` is not `SUCCESS`.
fn send_rejected(body: &Value) -> bool {
    let Some(code) = body.pointer("/status/code") else {
        return false;
    };
    let data_success = body.pointer("/data/code").and_then(Value::as_str) == Some("SUCCESS");
    code.as_i64() != Some(200) && !data_success
}

#[cfg(test)]
#[path = "tests/oauth_tests.rs"]
mod tests;
