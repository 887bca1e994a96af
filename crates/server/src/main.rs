use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use mail_relay::{build_backend, Relay};
use shared::protocol::SUBMIT_CONSULTATION_ROUTE;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use app_state::AppState;
use config::load_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    settings.validate()?;

    let backend = build_backend(settings.mailer_config(), settings.upstream_timeout())
        .context("failed to build upstream HTTP client")?;
    let relay = Relay::new(backend);
    let origin = settings.site_origin()?;
    info!(backend = relay.backend_name(), %origin, "relay configured");

    let state = AppState::new(relay, &origin)?;
    let app = build_router(Arc::new(state));

    let addr = settings.bind_addr()?;
    info!(%addr, "consultation relay listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            SUBMIT_CONSULTATION_ROUTE,
            post(api::submit_consultation)
                .options(api::preflight)
                .fallback(api::method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(api::MAX_SUBMISSION_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(error) => {
            tracing::error!(%error, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
