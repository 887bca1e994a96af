use serde::{Deserialize, Serialize};

use crate::{error::MissingFieldsError, protocol::SubmissionPayload};

pub const FIRST_NAME: &str = "firstName";
pub const LAST_NAME: &str = "lastName";
pub const EMAIL: &str = "email";

/// A consultation request whose required fields are known to be present.
///
/// Values are kept exactly as submitted; only the presence checks trim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ConsultationRequest {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl TryFrom<SubmissionPayload> for ConsultationRequest {
    type Error = MissingFieldsError;

    fn try_from(payload: SubmissionPayload) -> Result<Self, Self::Error> {
        let mut missing = Vec::new();
        let first_name = required(payload.first_name, FIRST_NAME, &mut missing);
        let last_name = required(payload.last_name, LAST_NAME, &mut missing);
        let email = required(payload.email, EMAIL, &mut missing);

        match (first_name, last_name, email) {
            (Some(first_name), Some(last_name), Some(email)) => Ok(Self {
                first_name,
                last_name,
                email,
                phone: optional(payload.phone),
                address: optional(payload.address),
                details: optional(payload.details),
            }),
            _ => Err(MissingFieldsError { fields: missing }),
        }
    }
}

impl From<ConsultationRequest> for SubmissionPayload {
    fn from(value: ConsultationRequest) -> Self {
        Self {
            first_name: Some(value.first_name),
            last_name: Some(value.last_name),
            email: Some(value.email),
            phone: value.phone,
            address: value.address,
            details: value.details,
        }
    }
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn required(
    value: Option<String>,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match value {
        Some(value) if !is_blank(&value) => Some(value),
        _ => {
            missing.push(name);
            None
        }
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|value| !is_blank(value))
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
