//! # General Route Handlers

use crate::types::HealthResponse;
use axum::Json;
use chrono::Utc;

/// The handler for the root (`/`) endpoint.
pub async fn root() -> &'static str {
    "docfield server is running."
}

/// The handler for the health check (`/health`) endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}
