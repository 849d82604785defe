use axum::Json;
use chrono::Utc;

use crate::types::HealthResponse;

/// Liveness check; does not touch any backend.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: Some(format!("medinote-api v{}", env!("CARGO_PKG_VERSION"))),
        timestamp: Utc::now(),
    })
}
