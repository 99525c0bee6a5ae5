pub mod payments;

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub store: String,
    pub authorization_mode: String,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let store_status = match state.store.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "health check: transaction store unreachable");
            "disconnected"
        }
    };

    let health_response = HealthStatus {
        status: if store_status == "connected" {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: store_status.to_string(),
        authorization_mode: state.intake.authorization_mode().to_string(),
    };

    // Return 503 if the store is down, 200 otherwise
    let status_code = if store_status == "connected" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health_response))
}
