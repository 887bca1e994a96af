use anyhow::Context;
use axum::http::{header, HeaderMap, HeaderValue};
use mail_relay::Relay;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) relay: Relay,
    pub(crate) cors: CorsPolicy,
}

impl AppState {
    pub(crate) fn new(relay: Relay, site_origin: &str) -> anyhow::Result<Self> {
        Ok(Self {
            relay,
            cors: CorsPolicy::new(site_origin)?,
        })
    }
}

/// Single-origin CORS policy for the relay endpoint.
#[derive(Debug, Clone)]
pub(crate) struct CorsPolicy {
    allowed_origin: HeaderValue,
}

impl CorsPolicy {
    pub(crate) fn new(site_origin: &str) -> anyhow::Result<Self> {
        let allowed_origin = HeaderValue::from_str(site_origin)
            .with_context(|| format!("origin '{site_origin}' is not a valid header value"))?;
        Ok(Self { allowed_origin })
    }

    pub(crate) fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            self.allowed_origin.clone(),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );
        headers
    }

    /// Requests without an `Origin` header (non-browser callers) pass.
    pub(crate) fn allows(&self, request_headers: &HeaderMap) -> bool {
        match request_headers.get(header::ORIGIN) {
            Some(origin) => *origin == self.allowed_origin,
            None => true,
        }
    }
}
