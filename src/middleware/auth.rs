use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::jwt::{is_rejected_token, JwtKeys};
use crate::models::AppState;
use crate::types::{AppError, AppResult};

const BEARER_PREFIX: &str = "Bearer ";

/// Identity attached to the request by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

/// Resolve the caller's identity from the `Authorization` header.
pub fn authenticate(headers: &HeaderMap, keys: &JwtKeys) -> AppResult<AuthenticatedUser> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .ok_or_else(|| AppError::unauthorized("No token provided"))?;

    let claims = keys.verify(token).map_err(|e| {
        if is_rejected_token(&e) {
            debug!(error = %e, "Rejected bearer token");
            AppError::unauthorized("Invalid token")
        } else {
            AppError::Internal(format!("Token verification failed: {}", e))
        }
    })?;

    Ok(AuthenticatedUser {
        user_id: claims.user_id,
    })
}

/// Requires a valid bearer token on every request it wraps.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(req.headers(), &state.jwt)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("No token provided"))
    }
}
