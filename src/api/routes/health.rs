//! Health and readiness endpoints

use axum::{Json, extract::State, http::StatusCode};

use crate::api::{
    state::ApiState,
    types::{HealthResponse, HealthStatus, ReadyResponse},
};

/// GET /health, GET /healthz
///
/// 200 while the session is valid and the last cycle succeeded, 503 otherwise
pub async fn health_check(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let response = HealthResponse::from(state.health.snapshot().await);

    let status = match response.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(response))
}

/// GET /ready, GET /readyz
///
/// Always 200 once the server is accepting connections
pub async fn ready_check() -> Json<ReadyResponse> {
    Json(ReadyResponse::ready())
}
