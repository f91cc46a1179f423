//! Health check endpoint.

use crate::error::ApiResult;
use crate::handlers::common::ApiResponse;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health - Verifies the database answers before reporting ok.
pub async fn health_check(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<HealthResponse>>> {
    state.metadata.health_check().await?;

    Ok(Json(ApiResponse::success(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })))
}
