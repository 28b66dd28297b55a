//! Same-origin relay endpoint.
//!
//! `GET /relay` fetches the upstream report and answers with a
//! [`RelayResponse`](crate::services::RelayResponse) envelope: 200 on success,
//! 500 when the upstream could not be read. `GET /health` reports liveness only.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::services::UpstreamClient;

#[derive(Clone)]
pub struct RelayState {
    pub upstream: Arc<UpstreamClient>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

/// Build the relay router.
pub fn build_app(state: RelayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/relay", get(relay))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

async fn relay(State(state): State<RelayState>) -> impl IntoResponse {
    let response = state.upstream.relay_response().await;
    let status = if response.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(response))
}

async fn health() -> Json<HealthData> {
    Json(HealthData { status: "ok" })
}

/// Serve the relay on `[relay].bind` until Ctrl-C.
pub async fn serve(config: &Config) -> Result<()> {
    let addr: SocketAddr = config
        .relay
        .bind
        .parse()
        .map_err(|e| AppError::config(format!("Invalid relay bind address: {e}")))?;

    let upstream = UpstreamClient::from_config(&config.feed)?;
    let app = build_app(RelayState {
        upstream: Arc::new(upstream),
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!(
        "Relay listening on http://{}/relay (upstream {})",
        addr,
        config.feed.upstream_url
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Received shutdown signal, stopping relay");
}
