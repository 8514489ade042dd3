//! Request extractors that report failures through the JSON error envelope

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::types::AppError;

/// JSON body that has passed `validator` checks.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: serde::de::DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| match err {
                JsonRejection::MissingJsonContentType(_) => {
                    AppError::bad_request("Missing Content-Type: application/json header")
                }
                JsonRejection::BytesRejection(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                    AppError::operational("Request body too large", StatusCode::PAYLOAD_TOO_LARGE)
                }
                JsonRejection::JsonDataError(e) => {
                    AppError::bad_request(format!("Invalid request body: {}", e.body_text()))
                }
                _ => AppError::bad_request("Invalid JSON payload"),
            })?;

        payload
            .validate()
            .map_err(|errors| AppError::bad_request(describe(&errors, "")))?;

        Ok(Self(payload))
    }
}

/// First failing field as `path: message`, walking into nested structs.
fn describe(errors: &ValidationErrors, prefix: &str) -> String {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                if let Some(error) = field_errors.first() {
                    return match &error.message {
                        Some(message) => format!("{}: {}", path, message),
                        None => format!("{}: invalid ({})", path, error.code),
                    };
                }
            }
            ValidationErrorsKind::Struct(inner) => return describe(inner, &path),
            ValidationErrorsKind::List(items) => {
                if let Some((index, inner)) = items.iter().next() {
                    return describe(inner, &format!("{}[{}]", path, index));
                }
            }
        }
    }
    "Validation failed".to_string()
}
