use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::warn;

use crate::models::{AppState, HealthResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, label, database) = match state.db.health_check().await {
        Ok(()) => (StatusCode::OK, "ok", "connected"),
        Err(e) => {
            warn!(error = %e, "Health check could not reach the database");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "disconnected")
        }
    };

    let response = HealthResponse {
        status: label.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        database: database.to_string(),
    };

    (status, Json(response))
}
