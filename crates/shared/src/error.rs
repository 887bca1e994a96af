use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON body returned by the relay for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Required consultation fields that were absent or blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required fields: {}", .fields.join(", "))]
pub struct MissingFieldsError {
    pub fields: Vec<&'static str>,
}

impl MissingFieldsError {
    pub fn field_list(&self) -> String {
        self.fields.join(", ")
    }
}

impl From<MissingFieldsError> for ErrorBody {
    fn from(value: MissingFieldsError) -> Self {
        Self::with_details("Missing required fields", value.field_list())
    }
}
