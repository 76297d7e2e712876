//! Image analysis handler.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};

use crate::ai::{analysis, payload, AnalysisResult, ImageUpload};
use crate::error::ProxyError;
use crate::http::response::ApiError;
use crate::http::server::AppState;

const ANALYSIS_FAILED: &str = "Failed to analyze image";

/// Multipart field carrying the photo.
const IMAGE_FIELD: &str = "image";

/// Analyze a food photo and return clean structured data.
pub async fn analyze_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let multipart = multipart.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let image = image_field(multipart)
        .await
        .map_err(|e| ApiError::from_proxy(e, ANALYSIS_FAILED))?;

    let payload = payload::analysis_payload(state.ai.config());
    let response = state
        .ai
        .complete(&payload, Some(image))
        .await
        .map_err(|e| ApiError::from_proxy(e, ANALYSIS_FAILED))?;

    let result = analysis::parse_analysis(&response).map_err(|e| ApiError::from_proxy(e, ANALYSIS_FAILED))?;

    tracing::info!(item = %result.item, expiration_days = result.expiration_days, "Image analyzed");
    Ok(Json(result))
}

async fn image_field(mut multipart: Multipart) -> Result<ImageUpload, ProxyError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ProxyError::validation(format!("Failed to read form data: {e}")))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ProxyError::validation(format!("Failed to read image data: {e}")))?;
        if bytes.is_empty() {
            break;
        }

        return Ok(ImageUpload {
            filename,
            content_type,
            bytes,
        });
    }

    Err(ProxyError::validation("No image uploaded"))
}
