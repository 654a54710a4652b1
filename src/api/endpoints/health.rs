//! Service info and health check endpoints.

use axum::Json;
use serde::Serialize;

use crate::config;

#[derive(Serialize)]
pub struct RootResponse {
    pub app: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

/// `GET /` — service identity.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        app: config::APP_NAME,
        version: config::APP_VERSION,
        status: "running",
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

/// `GET /health` — liveness check.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
