//! Attachment proxy handlers.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::{IntoResponse, Response},
};

use crate::documents::AttachmentUpload;
use crate::error::ProxyError;
use crate::http::response::ApiError;
use crate::http::server::AppState;

const UPLOAD_FAILED: &str = "Failed to upload attachment";

pub async fn list_attachments(State(state): State<AppState>) -> Result<Response, ApiError> {
    let reply = state
        .documents
        .list_attachments()
        .await
        .map_err(|e| ApiError::from_proxy(e, "Failed to fetch attachments"))?;
    Ok(reply.into_response())
}

/// Relay exactly one uploaded file to the document service.
pub async fn upload_attachment(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let upload = single_file(multipart)
        .await
        .map_err(|e| ApiError::from_proxy(e, UPLOAD_FAILED))?;

    tracing::debug!(filename = %upload.filename, size = upload.bytes.len(), "Uploading attachment");

    let reply = state
        .documents
        .upload_attachment(upload)
        .await
        .map_err(|e| ApiError::from_proxy(e, UPLOAD_FAILED))?;
    Ok(reply.into_response())
}

/// Read the form and return its only file part. Non-file fields are ignored.
async fn single_file(mut multipart: Multipart) -> Result<AttachmentUpload, ProxyError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ProxyError::validation(format!("Failed to read form data: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if upload.is_some() {
            return Err(ProxyError::validation("Exactly one file must be uploaded"));
        }

        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ProxyError::validation(format!("Failed to read file data: {e}")))?;

        upload = Some(AttachmentUpload {
            filename,
            content_type,
            bytes,
        });
    }

    upload.ok_or_else(|| ProxyError::validation("No file uploaded"))
}
