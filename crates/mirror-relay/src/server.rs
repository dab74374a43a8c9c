//! HTTP server for monday.com webhooks.

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::signal;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use crate::client::ItemsApi;
use crate::config::Config;
use crate::error::RelayError;
use crate::handlers::dispatch::dispatch;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Configuration.
    pub config: Arc<Config>,
    /// monday.com API client.
    pub api: Arc<dyn ItemsApi>,
}

impl AppState {
    /// Bundle configuration and API client.
    pub fn new(config: Config, api: impl ItemsApi + 'static) -> Self {
        Self {
            config: Arc::new(config),
            api: Arc::new(api),
        }
    }
}

/// Build the HTTP router.
///
/// The webhook is served at `/` as well as `/webhooks/monday` so existing
/// registrations pointing at the bare host keep working.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/", post(monday_webhook_handler))
        .route("/webhooks/monday", post(monday_webhook_handler))
        .route("/health", get(health_check))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl+C or SIGTERM.
pub async fn run_server(state: AppState, addr: &str) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Mirror relay listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Mirror relay stopped");
    Ok(())
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "mirror-relay",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Handle incoming monday.com webhooks.
///
/// Rejections are logged here; the error renders its own status and body.
pub async fn monday_webhook_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, RelayError> {
    debug!(body = %String::from_utf8_lossy(&body), "Received webhook payload");

    match dispatch(state.api.as_ref(), &body).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            if e.status_code().is_client_error() {
                warn!(error = %e, "Rejected webhook payload");
            } else {
                error!(error = %e, "Failed to process webhook");
            }
            Err(e)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
