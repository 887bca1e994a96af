use shared::error::MissingFieldsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    MissingFields(#[from] MissingFieldsError),
    #[error("email provider authentication failed: {0}")]
    Authentication(String),
    #[error("email provider did not accept the message: {0}")]
    UpstreamSend(String),
}

impl RelayError {
    /// Whether the caller can fix the failure by correcting its input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::MissingFields(_))
    }
}

/// Stage of an upstream exchange, used to classify transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UpstreamStage {
    Authenticate,
    Send,
}

pub(crate) fn transport_error(stage: UpstreamStage, err: reqwest::Error) -> RelayError {
    if err.is_timeout() {
        return RelayError::UpstreamSend(format!("{stage:?} request timed out"));
    }
    match stage {
        UpstreamStage::Authenticate => {
            RelayError::Authentication(format!("token request failed: {err}"))
        }
        UpstreamStage::Send => RelayError::UpstreamSend(format!("send request failed: {err}")),
    }
}
