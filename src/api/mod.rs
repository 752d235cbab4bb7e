//! Exposition server
//!
//! ## Endpoints
//!
//! - `GET /` - Landing page with version and health
//! - `GET /metrics` - Prometheus text format
//! - `GET /health`, `GET /healthz` - Health as JSON, 503 when unhealthy
//! - `GET /ready`, `GET /readyz` - Readiness, always 200
//!
//! Handlers only read shared state. Anything else is a 404.

pub mod error;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{HealthResponse, HealthStatus, ReadyResponse};

use std::net::SocketAddr;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:9118")
    pub bind_addr: SocketAddr,
}

/// Build the router with all routes
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(routes::index::index))
        .route("/metrics", get(routes::metrics::get_metrics))
        .route("/health", get(routes::health::health_check))
        .route("/healthz", get(routes::health::health_check))
        .route("/ready", get(routes::health::ready_check))
        .route("/readyz", get(routes::health::ready_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Spawn the API server
///
/// Binds before returning, so a port conflict surfaces here. Returns the
/// server's local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("exporter listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
