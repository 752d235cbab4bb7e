//! Prometheus scrape endpoint

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, TextEncoder};

use crate::api::{error::ApiResult, state::ApiState};

/// GET /metrics
///
/// Renders the registry as it stands; no upstream call is made.
pub async fn get_metrics(State(state): State<ApiState>) -> ApiResult<Response> {
    let body = state.metrics.encode()?;

    Ok((
        [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
        body,
    )
        .into_response())
}
