// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service info, liveness, and the JSON 404 for unknown routes.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

/// GET / - Service info
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": 200,
        "message": "Hello world!",
        "data": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "environment": state.config.environment,
            "endpoints": {
                "students": "/students[/:studentId] (protected)",
                "uploads": "/uploads/:file",
                "health": "/health"
            }
        }
    }))
}

/// GET /health - Liveness plus a store round trip
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.service.store().health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": 200,
                "message": "ok",
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": 503,
                    "message": "store unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "store_error": e.to_string()
                    }
                })),
            )
        }
    }
}

/// Fallback for unmatched routes
pub async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}
