use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use plotmap_shared::models::{HealthReport, SystemStats};

use super::AppState;
use crate::error::Result;

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    match state.storage.ping() {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthReport {
                status: "healthy".to_string(),
                database: "connected".to_string(),
                timestamp: Some(Utc::now()),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthReport {
                    status: "unhealthy".to_string(),
                    database: "disconnected".to_string(),
                    timestamp: Some(Utc::now()),
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<SystemStats>> {
    Ok(Json(state.storage.stats()?))
}
