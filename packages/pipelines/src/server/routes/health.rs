use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    pipelines: usize,
}

/// Health check endpoint
///
/// Returns 200 OK while at least one pipeline is registered, 503 otherwise.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let pipelines = state.registry.len();
    let (status_code, status) = if pipelines > 0 {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "no pipelines")
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            pipelines,
        }),
    )
}
