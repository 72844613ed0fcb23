use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::services::{PipelineRunner, ProcessOutcome};

/// Name of the multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// Multipart form accepted by the upload endpoint
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// Encoded image (PNG, JPEG, GIF, BMP, WebP, ...)
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
}

/// Upload an image for the frame
///
/// The image is fitted onto the 800×480 canvas, dithered to the six panel
/// colors and published as `image.bin`, `image.h` and `stats.json`.
#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image converted", body = ProcessOutcome),
        (status = 400, description = "Malformed upload or missing image field", body = ProcessOutcome),
        (status = 413, description = "Upload too large", body = ProcessOutcome),
        (status = 422, description = "Upload is not a decodable image", body = ProcessOutcome),
        (status = 500, description = "Conversion failed", body = ProcessOutcome),
    ),
    tag = "Upload"
)]
pub async fn handle_upload(
    State(runner): State<PipelineRunner>,
    limit: usize,
    mut multipart: Multipart,
) -> Result<Json<ProcessOutcome>, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            tracing::debug!(field = ?field.name(), "Ignoring multipart field");
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or(ApiError::MissingField(IMAGE_FIELD))?;
    tracing::info!(
        filename = filename.as_deref().unwrap_or("(none)"),
        bytes = bytes.len(),
        "Upload received"
    );

    let report = runner.run(bytes.to_vec()).await?;
    Ok(Json(report.into()))
}

fn multipart_error(e: axum::extract::multipart::MultipartError, limit: usize) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::UploadTooLarge { limit }
    } else {
        ApiError::InvalidUpload(e.body_text())
    }
}
