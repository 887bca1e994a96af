use super::*;
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use shared::protocol::{SubmissionPayload, SubmitAck};
use tokio::sync::{Mutex, Notify};

use crate::relay_client::{HttpRelayClient, RelayClientError};

#[derive(Default)]
struct MockRelay {
    calls: AtomicUsize,
    received: Mutex<Vec<SubmissionPayload>>,
    reject: bool,
    gate: Option<Arc<Notify>>,
}

#[async_trait]
impl RelayClient for MockRelay {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmitAck, RelayClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().await.push(payload.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.reject {
            return Err(RelayClientError::Rejected {
                status: 500,
                message: "Internal Server Error".into(),
            });
        }
        Ok(SubmitAck::accepted())
    }
}

async fn fill_required(controller: &IntakeController<Arc<MockRelay>>) {
    controller.update_field(IntakeField::FirstName, "Jane").await;
    controller.update_field(IntakeField::LastName, "Doe").await;
    controller.update_field(IntakeField::Email, "jane@x.com").await;
}

#[tokio::test]
async fn starts_idle_without_feedback() {
    let controller = IntakeController::new(Arc::new(MockRelay::default()));
    assert_eq!(controller.state().await, SubmissionState::Idle);
    assert!(controller.feedback().await.is_none());
    assert!(!controller.inputs_disabled().await);
}

#[tokio::test]
async fn blank_required_fields_never_reach_the_relay() {
    for (first, last, email) in [
        ("", "Doe", "jane@x.com"),
        ("Jane", "  ", "jane@x.com"),
        ("Jane", "Doe", "\t"),
    ] {
        let relay = Arc::new(MockRelay::default());
        let controller = IntakeController::new(relay.clone());
        controller.update_field(IntakeField::FirstName, first).await;
        controller.update_field(IntakeField::LastName, last).await;
        controller.update_field(IntakeField::Email, email).await;

        assert_eq!(controller.submit().await, SubmitOutcome::Invalid);
        assert_eq!(
            controller.state().await,
            SubmissionState::Error(FailureKind::Validation)
        );
        let feedback = controller.feedback().await.expect("feedback");
        assert_eq!(feedback.kind, FeedbackKind::Error);
        assert_eq!(feedback.message, IntakeMessages::default().validation);
        assert_eq!(relay.calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn successful_submission_resets_fields() {
    let relay = Arc::new(MockRelay::default());
    let controller = IntakeController::new(relay.clone());
    fill_required(&controller).await;
    controller.update_field(IntakeField::Details, "Aluminum extrusions").await;

    assert_eq!(controller.submit().await, SubmitOutcome::Sent);

    assert_eq!(controller.state().await, SubmissionState::Success);
    assert!(controller.fields().await.is_empty());
    let feedback = controller.feedback().await.expect("feedback");
    assert_eq!(feedback.kind, FeedbackKind::Success);
    assert_eq!(relay.calls.load(Ordering::SeqCst), 1);

    let received = relay.received.lock().await;
    assert_eq!(received[0].first_name.as_deref(), Some("Jane"));
    assert_eq!(received[0].details.as_deref(), Some("Aluminum extrusions"));
    assert!(received[0].phone.is_none());
}

#[tokio::test]
async fn rejected_submission_keeps_fields_for_retry() {
    let relay = Arc::new(MockRelay {
        reject: true,
        ..MockRelay::default()
    });
    let controller = IntakeController::new(relay.clone());
    fill_required(&controller).await;
    let before = controller.fields().await;

    assert_eq!(controller.submit().await, SubmitOutcome::Failed);

    assert_eq!(
        controller.state().await,
        SubmissionState::Error(FailureKind::Delivery)
    );
    assert_eq!(controller.fields().await, before);
    let feedback = controller.feedback().await.expect("feedback");
    assert!(feedback.message.contains(DEFAULT_FALLBACK_CONTACT));

    assert_eq!(controller.submit().await, SubmitOutcome::Failed);
    assert_eq!(relay.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unreachable_relay_keeps_fields_and_reports_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = HttpRelayClient::with_timeout(&format!("http://{addr}"), Duration::from_secs(2))
        .expect("client");
    let controller = IntakeController::new(client);
    controller.update_field(IntakeField::FirstName, "Jane").await;
    controller.update_field(IntakeField::LastName, "Doe").await;
    controller.update_field(IntakeField::Email, "jane@x.com").await;

    assert_eq!(controller.submit().await, SubmitOutcome::Failed);
    assert_eq!(
        controller.state().await,
        SubmissionState::Error(FailureKind::Delivery)
    );
    assert_eq!(controller.fields().await.email, "jane@x.com");
}

#[tokio::test]
async fn submit_while_in_flight_is_ignored() {
    let gate = Arc::new(Notify::new());
    let relay = Arc::new(MockRelay {
        gate: Some(gate.clone()),
        ..MockRelay::default()
    });
    let controller = Arc::new(IntakeController::new(relay.clone()));
    fill_required(&controller).await;

    let in_flight = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit().await }
    });

    while relay.calls.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(controller.state().await, SubmissionState::Submitting);
    assert!(controller.inputs_disabled().await);
    assert!(controller.show_loading().await);
    assert!(controller.feedback().await.is_none());

    assert_eq!(controller.submit().await, SubmitOutcome::Ignored);
    assert!(!controller.update_field(IntakeField::Email, "other@x.com").await);

    gate.notify_one();
    assert_eq!(in_flight.await.expect("join"), SubmitOutcome::Sent);
    assert_eq!(relay.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn abandoned_submit_releases_the_form() {
    let relay = Arc::new(MockRelay {
        gate: Some(Arc::new(Notify::new())),
        ..MockRelay::default()
    });
    let controller = IntakeController::new(relay.clone());
    fill_required(&controller).await;

    let timed_out = tokio::time::timeout(Duration::from_millis(50), controller.submit()).await;
    assert!(timed_out.is_err());

    assert_eq!(
        controller.state().await,
        SubmissionState::Error(FailureKind::Delivery)
    );
    assert_eq!(controller.fields().await.first_name, "Jane");
    let feedback = controller.feedback().await.expect("feedback");
    assert_eq!(feedback.message, IntakeMessages::default().fallback);

    assert!(!controller.inputs_disabled().await);
    assert!(controller.update_field(IntakeField::Phone, "555-0100").await);
    assert_eq!(controller.state().await, SubmissionState::Idle);
    assert_eq!(relay.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn editing_after_error_clears_feedback() {
    let relay = Arc::new(MockRelay::default());
    let controller = IntakeController::new(relay);
    assert_eq!(controller.submit().await, SubmitOutcome::Invalid);
    assert!(controller.feedback().await.is_some());

    assert!(controller.update_field(IntakeField::FirstName, "J").await);
    assert_eq!(controller.state().await, SubmissionState::Idle);
    assert!(controller.feedback().await.is_none());
}

#[tokio::test]
async fn custom_fallback_contact_is_used() {
    let relay = Arc::new(MockRelay {
        reject: true,
        ..MockRelay::default()
    });
    let controller = IntakeController::with_messages(
        relay,
        IntakeMessages::with_fallback_contact("hello@example.com"),
    );
    fill_required(&controller).await;
    controller.submit().await;

    let feedback = controller.feedback().await.expect("feedback");
    assert!(feedback.message.ends_with("email us directly at hello@example.com."));
}
