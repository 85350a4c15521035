// handlers/mod.rs - two handler tiers
//
// Public (no auth, strict rate limit on submissions) → Protected (bearer JWT,
// then a per-module access check). Routing lives in `app.rs`.

pub mod public;
pub mod protected;

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::state::AppState;

/// GET / - service descriptor
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "modules": ["adhesion", "formation", "webinaire", "tresorerie", "secretariat", "mentorat", "recrutement"],
        }
    }))
}

/// GET /health - liveness plus a store round-trip
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let store = match &state.pool {
        Some(pool) => match DatabaseManager::health_check(pool).await {
            Ok(()) => "postgres",
            Err(e) => {
                tracing::error!("Health check failed: {}", e);
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "success": false, "status": "degraded", "store": "postgres" })),
                );
            }
        },
        None => "memory",
    };

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "status": "healthy",
            "store": store,
            "side_effect_failures": state.effects.failures().await.len(),
        })),
    )
}

/// JSON 404 for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
