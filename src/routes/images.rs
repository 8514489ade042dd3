use axum::{routing::post, Json, Router};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::info;

use crate::middleware::AuthenticatedUser;
use crate::models::{AppState, CompressImageRequest, CompressImageResponse};
use crate::routes::extract::ValidatedJson;
use crate::types::AppResult;
use crate::utils::image::{self, DEFAULT_MAX_DIMENSION, DEFAULT_QUALITY};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/images/compress", post(compress))
        .with_state(state)
}

async fn compress(
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CompressImageRequest>,
) -> AppResult<Json<CompressImageResponse>> {
    let decoded = image::decode_image_payload(&request.image)?;
    let original_size = decoded.data.len();

    let jpeg = image::compress_image_async(
        decoded.data,
        request.max_dimension.unwrap_or(DEFAULT_MAX_DIMENSION),
        request.quality.unwrap_or(DEFAULT_QUALITY),
    )
    .await?;

    info!(user_id = %user.user_id, original_size, size = jpeg.len(), "Image compressed");

    Ok(Json(CompressImageResponse {
        size: jpeg.len(),
        data: STANDARD.encode(&jpeg),
        mime_type: mime::IMAGE_JPEG.to_string(),
    }))
}
