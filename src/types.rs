// Error taxonomy, the JSON error envelope and AI call types

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::config::RuntimeMode;

/// Body sent to clients when internal details are hidden.
pub const GENERIC_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Expected failure with a message that is safe to show to clients.
    #[error("{message}")]
    Operational { status: StatusCode, message: String },

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Timed out waiting for a database connection")]
    PoolTimeout,

    #[error("AI API error: {0}")]
    AiApi(String),

    #[error("Image processing error: {0}")]
    Image(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn operational(message: impl Into<String>, status: StatusCode) -> Self {
        Self::Operational {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::operational(message, StatusCode::UNAUTHORIZED)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::operational(message, StatusCode::BAD_REQUEST)
    }

    pub fn is_operational(&self) -> bool {
        matches!(self, Self::Operational { .. })
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Operational { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Status and envelope for this error under the given runtime mode.
    pub fn render(&self, mode: RuntimeMode) -> (StatusCode, ErrorResponse) {
        let message = match self {
            Self::Operational { message, .. } => message.clone(),
            _ if mode.masks_internal_errors() => GENERIC_ERROR_MESSAGE.to_string(),
            other => other.detail(),
        };
        (self.status_code(), ErrorResponse::new(message))
    }

    /// The underlying message, without the variant prefix used in logs.
    pub fn detail(&self) -> String {
        match self {
            Self::Operational { message, .. } => message.clone(),
            Self::Database(err) => err.to_string(),
            Self::Serialization(err) => err.to_string(),
            Self::AiApi(message) | Self::Image(message) | Self::Internal(message) => message.clone(),
            Self::PoolTimeout => self.to_string(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Self::PoolTimeout,
            other => Self::Database(other),
        }
    }
}

/// Uniform error envelope: `{"error": "...", "status": "error"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: &'static str,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            status: "error",
        }
    }
}

/// An error travelling back to the error-handling middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport(pub Arc<AppError>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Rendered masked until `handle_errors` re-renders it for the active mode.
        let (status, body) = self.render(RuntimeMode::Production);
        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(ErrorReport(Arc::new(self)));
        response
    }
}

/// Output shape requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Json,
    Text,
}

/// An encoded image (JPEG, PNG, ...) passed to the model inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub data: bytes::Bytes,
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(data: impl Into<bytes::Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn jpeg(data: impl Into<bytes::Bytes>) -> Self {
        Self::new(data, mime::IMAGE_JPEG.as_ref())
    }
}

/// A single generation request.
#[derive(Debug, Clone, Default)]
pub struct AiCallOptions {
    /// Empty means the gateway's default model.
    pub model: String,
    pub prompt: String,
    pub images: Vec<ImageInput>,
    pub response_format: Option<ResponseFormat>,
    /// Reasoning-token budget hint; `Some(0)` disables thinking.
    pub thinking_budget: Option<i32>,
}

impl AiCallOptions {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn model(mut self, model: Option<&str>) -> Self {
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.model = model.trim().to_string();
        }
        self
    }

    pub fn images(mut self, images: Vec<ImageInput>) -> Self {
        self.images = images;
        self
    }

    pub fn json(mut self) -> Self {
        self.response_format = Some(ResponseFormat::Json);
        self
    }

    pub fn thinking_budget(mut self, budget: i32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AiResponse {
    pub text: String,
}
