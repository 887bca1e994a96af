//! Client-side intake logic for the consultation form: field state,
//! validation, the submission lifecycle and the relay client it drives.

mod controller;
pub mod embed;
mod form;
mod relay_client;

pub use controller::{
    FailureKind, Feedback, FeedbackKind, IntakeController, IntakeMessages, SubmissionState,
    SubmitOutcome, DEFAULT_FALLBACK_CONTACT,
};
pub use form::{FormValidationError, IntakeField, IntakeFields};
pub use relay_client::{HttpRelayClient, RelayClient, RelayClientError, DEFAULT_RELAY_TIMEOUT};
