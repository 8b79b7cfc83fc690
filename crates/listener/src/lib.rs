//! Herald webhook receiver.
//!
//! Exposes the GitHub webhook endpoints over HTTP and hands every parsed body
//! to a [`commands::EventController`]:
//!
//! | Route | Body | Controller call |
//! |-------|------|-----------------|
//! | `POST /events/github/issues` | [`pipeline::IssueEventBody`] | `process_issue_event` |
//! | `POST /events/github/pull-requests` | [`pipeline::PullRequestEventBody`] | `process_pull_request_event` |
//! | `GET /health` | | |
//!
//! Event routes answer `200` with an empty body whether the event was acted on
//! or ignored. Failures are mapped to status codes by [`ListenerError`].
//!
//! When a [`WebhookSecret`] is configured, event routes require a valid
//! `X-Hub-Signature-256` header. Every request runs inside a span carrying the
//! `X-GitHub-Delivery` id (or a generated one).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Routing, body buffering and HTTP status mapping live
//! here. Nothing below [`commands`] knows it is being driven over HTTP.

use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use commands::{EventController, EventOutcome};
use pipeline::{DeliveryId, IssueEventBody, PullRequestEventBody};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, Span};

pub mod errors;
mod signature;

pub use errors::ListenerError;
pub use signature::{SignatureError, WebhookSecret, MAX_PAYLOAD_BYTES, SIGNATURE_HEADER};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

pub const DELIVERY_HEADER: &str = "x-github-delivery";

pub const ISSUES_PATH: &str = "/events/github/issues";
pub const PULL_REQUESTS_PATH: &str = "/events/github/pull-requests";
pub const HEALTH_PATH: &str = "/health";

/// Shared state for every route.
#[derive(Clone)]
pub struct AppState {
    controller: EventController,
    webhook_secret: Option<Arc<WebhookSecret>>,
}

impl AppState {
    pub fn new(controller: EventController, webhook_secret: Option<WebhookSecret>) -> Self {
        Self {
            controller,
            webhook_secret: webhook_secret.map(Arc::new),
        }
    }

    pub fn webhook_secret(&self) -> Option<&WebhookSecret> {
        self.webhook_secret.as_deref()
    }
}

pub fn create_router(state: AppState) -> Router {
    let event_routes = Router::new()
        .route(ISSUES_PATH, post(handle_issue_event))
        .route(PULL_REQUESTS_PATH, post(handle_pull_request_event))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            signature::require_signature,
        ));

    let health_routes = Router::new().route(HEALTH_PATH, get(handle_health_check));

    Router::new()
        .merge(event_routes)
        .merge(health_routes)
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

fn request_span(request: &Request) -> Span {
    let delivery_id = request
        .headers()
        .get(DELIVERY_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(DeliveryId::new)
        .unwrap_or_else(DeliveryId::new_random);

    info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        delivery_id = %delivery_id,
    )
}

// ============================================================================
// Handlers
// ============================================================================

async fn handle_issue_event(
    State(state): State<AppState>,
    Json(body): Json<IssueEventBody>,
) -> Result<StatusCode, ListenerError> {
    let outcome = state.controller.process_issue_event(body).await?;
    log_outcome("issues", outcome);
    Ok(StatusCode::OK)
}

async fn handle_pull_request_event(
    State(state): State<AppState>,
    Json(body): Json<PullRequestEventBody>,
) -> Result<StatusCode, ListenerError> {
    let outcome = state.controller.process_pull_request_event(body).await?;
    log_outcome("pull_request", outcome);
    Ok(StatusCode::OK)
}

fn log_outcome(event: &str, outcome: EventOutcome) {
    match outcome {
        EventOutcome::Notified => info!(event, "Webhook processed"),
        EventOutcome::Ignored => info!(event, "Webhook ignored"),
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("Failed to bind to address {address}: {source}")]
    BindFailed {
        address: SocketAddr,
        source: std::io::Error,
    },

    #[error("Server failed: {0}")]
    ServerFailed(#[source] std::io::Error),
}

/// Serves `router` on `address` until `shutdown` resolves, then lets in-flight
/// requests finish.
pub async fn serve<F>(address: SocketAddr, router: Router, shutdown: F) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|source| ServeError::BindFailed { address, source })?;

    info!(%address, "Starting HTTP server");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServeError::ServerFailed)?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
