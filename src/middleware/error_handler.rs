// Terminal error handling: every failure leaves here as `{error, status: "error"}`

use std::any::Any;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::config::RuntimeMode;
use crate::types::{AppError, ErrorReport};

/// Outermost application middleware. Re-renders errors produced further down
/// the chain for the active runtime mode and logs the unexpected ones.
pub async fn handle_errors(
    State(mode): State<RuntimeMode>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let mut response = next.run(req).await;
    let Some(ErrorReport(err)) = response.extensions_mut().remove::<ErrorReport>() else {
        return response;
    };

    if !err.is_operational() {
        error!(%method, %path, error = %err, "Unhandled error");
    }

    let (status, body) = err.render(mode);
    (status, Json(body)).into_response()
}

/// Converts a handler panic into an unexpected error.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    AppError::Internal(format!("handler panicked: {}", detail)).into_response()
}
