use axum::{routing::get, Json, Router};

use crate::middleware::AuthenticatedUser;
use crate::models::{AppState, SessionResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/session", get(current_session))
        .with_state(state)
}

/// Echoes the identity carried by the caller's token.
async fn current_session(user: AuthenticatedUser) -> Json<SessionResponse> {
    Json(SessionResponse {
        user_id: user.user_id,
    })
}
