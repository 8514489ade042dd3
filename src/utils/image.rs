// Image decoding and compression for uploads sent to the model

use std::io::Cursor;

use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tracing::debug;

use crate::models::ImagePayload;
use crate::types::{AppError, AppResult, ImageInput};

pub const DEFAULT_MAX_DIMENSION: u32 = 1024;
pub const DEFAULT_QUALITY: u8 = 80;

/// Downscale so the longest side is at most `max_dimension` and re-encode as
/// JPEG. Smaller images keep their size. Transparency is flattened.
pub fn compress_image(data: &[u8], max_dimension: u32, quality: u8) -> AppResult<Vec<u8>> {
    let img = image::load_from_memory(data).map_err(|e| {
        AppError::operational(format!("Unsupported or corrupt image: {}", e), StatusCode::BAD_REQUEST)
    })?;

    let (width, height) = (img.width(), img.height());
    let img = if width > max_dimension || height > max_dimension {
        img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let mut out = Cursor::new(Vec::with_capacity(data.len() / 2));
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|e| AppError::Image(format!("JPEG encoding failed: {}", e)))?;

    let out = out.into_inner();
    debug!(
        from = %format!("{}x{}", width, height),
        to = %format!("{}x{}", rgb.width(), rgb.height()),
        in_bytes = data.len(),
        out_bytes = out.len(),
        "Compressed image"
    );
    Ok(out)
}

/// Runs [`compress_image`] on the blocking pool.
pub async fn compress_image_async(data: Bytes, max_dimension: u32, quality: u8) -> AppResult<Vec<u8>> {
    tokio::task::spawn_blocking(move || compress_image(&data, max_dimension, quality))
        .await
        .map_err(|e| AppError::Internal(format!("Image task failed: {}", e)))?
}

/// Decode a base64 upload. Accepts a bare payload or a `data:<mime>;base64,` URL.
pub fn decode_image_payload(payload: &ImagePayload) -> AppResult<ImageInput> {
    let raw = payload.data.trim();
    let (url_mime, encoded) = match raw.strip_prefix("data:") {
        Some(rest) => {
            let (header, body) = rest.split_once(',').ok_or_else(invalid_encoding)?;
            let mime = header.strip_suffix(";base64").ok_or_else(invalid_encoding)?;
            (Some(mime), body)
        }
        None => (None, raw),
    };

    let data = STANDARD.decode(encoded).map_err(|_| invalid_encoding())?;
    if data.is_empty() {
        return Err(invalid_encoding());
    }

    let declared = payload.mime_type.as_deref().or(url_mime).filter(|m| !m.is_empty());
    let mime_type = match declared {
        Some(m) => {
            let parsed: mime::Mime = m.parse().map_err(|_| {
                AppError::operational(format!("Invalid image type: {}", m), StatusCode::BAD_REQUEST)
            })?;
            if parsed.type_() != mime::IMAGE {
                return Err(AppError::operational(
                    format!("Expected an image, got {}", parsed),
                    StatusCode::BAD_REQUEST,
                ));
            }
            parsed.essence_str().to_string()
        }
        None => image::guess_format(&data)
            .map(|f| f.to_mime_type().to_string())
            .unwrap_or_else(|_| mime::IMAGE_JPEG.to_string()),
    };

    Ok(ImageInput::new(data, mime_type))
}

/// Decode an upload and shrink it to model-friendly JPEG.
pub async fn prepare_image(payload: &ImagePayload) -> AppResult<ImageInput> {
    let decoded = decode_image_payload(payload)?;
    let jpeg = compress_image_async(decoded.data, DEFAULT_MAX_DIMENSION, DEFAULT_QUALITY).await?;
    Ok(ImageInput::jpeg(jpeg))
}

pub async fn prepare_images(payloads: &[ImagePayload]) -> AppResult<Vec<ImageInput>> {
    let mut images = Vec::with_capacity(payloads.len());
    for payload in payloads {
        images.push(prepare_image(payload).await?);
    }
    Ok(images)
}

fn invalid_encoding() -> AppError {
    AppError::operational("Invalid image encoding", StatusCode::BAD_REQUEST)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

    /// A gradient PNG with an alpha channel.
    pub fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 200])
        });
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }
}
