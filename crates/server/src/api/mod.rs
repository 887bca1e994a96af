use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use mail_relay::RelayError;
use shared::{
    error::ErrorBody,
    protocol::{SubmissionPayload, SubmitAck},
};
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use crate::app_state::AppState;

pub(crate) const MAX_SUBMISSION_BYTES: usize = 64 * 1024;

type RelayReply = (StatusCode, HeaderMap, Json<SubmitAck>);
type RelayFailure = (StatusCode, HeaderMap, Json<ErrorBody>);

pub(crate) async fn submit_consultation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<RelayReply, RelayFailure> {
    let submission_id = Uuid::new_v4();
    relay_submission(&state, &headers, &body)
        .instrument(info_span!("consultation", %submission_id))
        .await
}

async fn relay_submission(
    state: &AppState,
    headers: &HeaderMap,
    body: &Result<Bytes, BytesRejection>,
) -> Result<RelayReply, RelayFailure> {
    let cors = state.cors.headers();

    if !state.cors.allows(headers) {
        warn!(origin = ?headers.get(header::ORIGIN), "rejecting cross-origin submission");
        return Err((
            StatusCode::FORBIDDEN,
            cors,
            Json(ErrorBody::new("Origin not allowed")),
        ));
    }

    let body = body.as_ref().map_err(|rejection| {
        warn!(%rejection, "rejecting unreadable submission body");
        let error = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            "Request body too large"
        } else {
            "Invalid request body"
        };
        (rejection.status(), cors.clone(), Json(ErrorBody::new(error)))
    })?;

    let payload: SubmissionPayload = serde_json::from_slice(body).map_err(|err| {
        warn!(%err, "rejecting unparsable submission body");
        (
            StatusCode::BAD_REQUEST,
            cors.clone(),
            Json(ErrorBody::new("Invalid JSON body")),
        )
    })?;

    match state.relay.send_consultation_email(payload).await {
        Ok(ack) => Ok((StatusCode::OK, cors, Json(ack))),
        Err(RelayError::MissingFields(missing)) => {
            Err((StatusCode::BAD_REQUEST, cors, Json(ErrorBody::from(missing))))
        }
        // Provider detail was logged by the relay and stays server-side.
        Err(RelayError::Authentication(_) | RelayError::UpstreamSend(_)) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            cors,
            Json(ErrorBody::new("Internal Server Error")),
        )),
    }
}

pub(crate) async fn preflight(State(state): State<Arc<AppState>>) -> (StatusCode, HeaderMap) {
    (StatusCode::NO_CONTENT, state.cors.headers())
}

pub(crate) async fn method_not_allowed(State(state): State<Arc<AppState>>) -> RelayFailure {
    let mut headers = state.cors.headers();
    headers.insert(header::ALLOW, HeaderValue::from_static("POST, OPTIONS"));
    (
        StatusCode::METHOD_NOT_ALLOWED,
        headers,
        Json(ErrorBody::new("Method Not Allowed")),
    )
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
