use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

struct RecordingBackend {
    calls: AtomicUsize,
    fail_with: Option<fn() -> RelayError>,
    last_body: tokio::sync::Mutex<Option<String>>,
}

impl RecordingBackend {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_with: None,
            last_body: tokio::sync::Mutex::new(None),
        })
    }

    fn failing(fail_with: fn() -> RelayError) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_with: Some(fail_with),
            last_body: tokio::sync::Mutex::new(None),
        })
    }
}

#[async_trait]
impl MailBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn deliver(
        &self,
        _request: &ConsultationRequest,
        message: &ComposedMessage,
    ) -> Result<(), RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_body.lock().await = Some(message.body.clone());
        match self.fail_with {
            Some(make_err) => Err(make_err()),
            None => Ok(()),
        }
    }
}

fn payload() -> SubmissionPayload {
    SubmissionPayload {
        first_name: Some("Jane".into()),
        last_name: Some("Doe".into()),
        email: Some("jane@x.com".into()),
        phone: Some("519-555-0100".into()),
        ..SubmissionPayload::default()
    }
}

#[tokio::test]
async fn valid_submission_is_delivered_once() {
    let backend = RecordingBackend::ok();
    let relay = Relay::new(backend.clone());

    let ack = relay
        .send_consultation_email(payload())
        .await
        .expect("delivered");

    assert!(ack.success);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    let body = backend.last_body.lock().await.clone().expect("body");
    assert!(body.contains("Phone: 519-555-0100"));
    assert!(body.contains("Address: N/A"));
}

#[tokio::test]
async fn missing_email_never_reaches_backend() {
    let backend = RecordingBackend::ok();
    let relay = Relay::new(backend.clone());
    let mut incoming = payload();
    incoming.email = None;

    let err = relay
        .send_consultation_email(incoming)
        .await
        .expect_err("should fail");

    assert!(err.is_validation());
    assert!(matches!(
        err,
        RelayError::MissingFields(ref missing) if missing.fields == vec!["email"]
    ));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn backend_failure_is_returned_without_retry() {
    let backend = RecordingBackend::failing(|| RelayError::UpstreamSend("boom".into()));
    let relay = Relay::new(backend.clone());

    let err = relay
        .send_consultation_email(payload())
        .await
        .expect_err("should fail");

    assert!(!err.is_validation());
    assert!(matches!(err, RelayError::UpstreamSend(_)));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn build_backend_selects_strategy_from_config() {
    let oauth = build_backend(
        MailerConfig::OAuth(OAuthConfig {
            token_url: oauth::DEFAULT_TOKEN_URL.into(),
            send_url: oauth::DEFAULT_SEND_URL.into(),
            refresh_token: "r".into(),
            client_id: "c".into(),
            client_secret: "s".into(),
            sender_address: "intake@example.com".into(),
        }),
        DEFAULT_UPSTREAM_TIMEOUT,
    )
    .expect("backend");
    assert_eq!(oauth.name(), "oauth");

    let template = build_backend(
        MailerConfig::Template(TemplateConfig {
            send_url: template::DEFAULT_SEND_URL.into(),
            service_id: "svc".into(),
            template_id: "tpl".into(),
            public_key: "pk".into(),
        }),
        DEFAULT_UPSTREAM_TIMEOUT,
    )
    .expect("backend");
    assert_eq!(Relay::new(template).backend_name(), "template");
}
