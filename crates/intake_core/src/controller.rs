use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::{
    form::{IntakeField, IntakeFields},
    relay_client::RelayClient,
};

pub const DEFAULT_FALLBACK_CONTACT: &str = "redbridgesolutions.co@gmail.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Required fields were blank or the email had no `@`.
    Validation,
    /// The relay was unreachable or refused the submission.
    Delivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Success,
    Error(FailureKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A submission was already in flight; nothing was dispatched.
    Ignored,
    Invalid,
    Sent,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub message: String,
}

/// User-facing copy shown by the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeMessages {
    pub validation: String,
    pub success: String,
    pub fallback: String,
}

impl IntakeMessages {
    pub fn with_fallback_contact(contact: &str) -> Self {
        Self {
            validation: "Please fill in your first name, last name, and a valid email address."
                .to_string(),
            success: "Thank you! Your consultation request has been sent. We'll be in touch shortly."
                .to_string(),
            fallback: format!(
                "Something went wrong while sending your request. Please try again, or email us directly at {contact}."
            ),
        }
    }
}

impl Default for IntakeMessages {
    fn default() -> Self {
        Self::with_fallback_contact(DEFAULT_FALLBACK_CONTACT)
    }
}

struct FormState {
    fields: IntakeFields,
    state: SubmissionState,
}

/// Drives the consultation form through `idle -> submitting -> success | error`.
///
/// Methods take `&self` so one controller can be shared by the input handlers
/// and the submit action. The state lock is never held across the relay call,
/// which is how a second `submit` observes the in-flight one and backs off.
/// A `submit` future dropped mid-flight leaves the form in
/// `Error(Delivery)` with the fields intact.
pub struct IntakeController<R> {
    relay: R,
    messages: IntakeMessages,
    inner: Mutex<FormState>,
}

impl<R: RelayClient> IntakeController<R> {
    pub fn new(relay: R) -> Self {
        Self::with_messages(relay, IntakeMessages::default())
    }

    pub fn with_messages(relay: R, messages: IntakeMessages) -> Self {
        Self {
            relay,
            messages,
            inner: Mutex::new(FormState {
                fields: IntakeFields::default(),
                state: SubmissionState::Idle,
            }),
        }
    }

    /// Returns `false` when inputs are disabled by an in-flight submission.
    pub async fn update_field(&self, field: IntakeField, value: impl Into<String>) -> bool {
        let mut inner = self.lock();
        if inner.state == SubmissionState::Submitting {
            debug!(%field, "ignoring edit while submitting");
            return false;
        }
        inner.fields.set(field, value);
        inner.state = SubmissionState::Idle;
        true
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let payload = {
            let mut inner = self.lock();
            if inner.state == SubmissionState::Submitting {
                debug!("submit ignored: request already in flight");
                return SubmitOutcome::Ignored;
            }
            match inner.fields.to_payload() {
                Ok(payload) => {
                    inner.state = SubmissionState::Submitting;
                    payload
                }
                Err(err) => {
                    debug!(%err, "submit blocked by form validation");
                    inner.state = SubmissionState::Error(FailureKind::Validation);
                    return SubmitOutcome::Invalid;
                }
            }
        };

        let mut in_flight = InFlight {
            inner: &self.inner,
            resolved: false,
        };
        let result = self.relay.submit(&payload).await;
        in_flight.resolved = true;

        let mut inner = self.lock();
        match result {
            Ok(_) => {
                info!("consultation request submitted");
                inner.fields.clear();
                inner.state = SubmissionState::Success;
                SubmitOutcome::Sent
            }
            Err(err) => {
                warn!(%err, "consultation request failed");
                inner.state = SubmissionState::Error(FailureKind::Delivery);
                SubmitOutcome::Failed
            }
        }
    }

    pub async fn state(&self) -> SubmissionState {
        self.lock().state
    }

    pub async fn fields(&self) -> IntakeFields {
        self.lock().fields.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        lock_state(&self.inner)
    }

    pub async fn inputs_disabled(&self) -> bool {
        self.state().await == SubmissionState::Submitting
    }

    pub async fn show_loading(&self) -> bool {
        self.inputs_disabled().await
    }

    pub async fn feedback(&self) -> Option<Feedback> {
        let (kind, message) = match self.state().await {
            SubmissionState::Idle | SubmissionState::Submitting => return None,
            SubmissionState::Success => (FeedbackKind::Success, &self.messages.success),
            SubmissionState::Error(FailureKind::Validation) => {
                (FeedbackKind::Error, &self.messages.validation)
            }
            SubmissionState::Error(FailureKind::Delivery) => {
                (FeedbackKind::Error, &self.messages.fallback)
            }
        };
        Some(Feedback {
            kind,
            message: message.clone(),
        })
    }
}

fn lock_state(inner: &Mutex<FormState>) -> MutexGuard<'_, FormState> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Armed while the relay call is pending; releases the form if the attempt
/// is abandoned before it resolves.
struct InFlight<'a> {
    inner: &'a Mutex<FormState>,
    resolved: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        let mut inner = lock_state(self.inner);
        if inner.state == SubmissionState::Submitting {
            warn!("consultation request abandoned before the relay answered");
            inner.state = SubmissionState::Error(FailureKind::Delivery);
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
