use axum::{
    Json,
    extract::{Multipart, State},
};
use futures::TryStreamExt;
use serde::Serialize;
use tokio_util::io::StreamReader;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::AppState;
use crate::api::error::AppError;
use crate::services::relay::{MediaKind, RelayOptions};
use crate::services::stager::StagedFile;

#[derive(Serialize, ToSchema)]
pub struct ImageUploadResponse {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

#[derive(Serialize, ToSchema)]
pub struct VideoUploadResponse {
    #[serde(rename = "videoUrl")]
    pub video_url: String,
}

#[utoipa::path(
    post,
    path = "/api/upload",
    responses(
        (status = 200, description = "Image relayed to the media service", body = ImageUploadResponse),
        (status = 400, description = "No file uploaded"),
        (status = 500, description = "Staging or relay failure")
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ImageUploadResponse>, AppError> {
    // Stage first; the relay client is never touched for file-less requests.
    let staged = stage_field(&state, multipart, "image")
        .await?
        .ok_or(AppError::MissingFile("No file uploaded."))?;

    let opts = RelayOptions {
        public_id: format!("image_{}", Uuid::new_v4().simple()),
        chunk_size: None,
    };
    let result = state
        .relay
        .relay(staged.path(), MediaKind::Image, opts)
        .await
        .map_err(AppError::ImageRelay)?;

    Ok(Json(ImageUploadResponse {
        image_url: result.remote_url,
    }))
}

#[utoipa::path(
    post,
    path = "/api/upload-video",
    responses(
        (status = 200, description = "Video relayed to the media service", body = VideoUploadResponse),
        (status = 400, description = "No video uploaded"),
        (status = 500, description = "Staging or relay failure")
    )
)]
pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<VideoUploadResponse>, AppError> {
    let staged = stage_field(&state, multipart, "video")
        .await?
        .ok_or(AppError::MissingFile("No video uploaded."))?;

    let opts = RelayOptions {
        public_id: format!("video_{}", Uuid::new_v4().simple()),
        chunk_size: Some(state.config.video_chunk_size),
    };
    let result = state
        .relay
        .relay(staged.path(), MediaKind::Video, opts)
        .await
        .map_err(AppError::VideoRelay)?;

    Ok(Json(VideoUploadResponse {
        video_url: result.remote_url,
    }))
}

/// Pulls the named file field out of the form and stages it locally.
///
/// Returns `None` when the field is absent so the caller can reject the
/// request before any relay work happens. The returned `StagedFile` owns
/// the scratch entry for the rest of the request.
async fn stage_field(
    state: &AppState,
    mut multipart: Multipart,
    field_name: &str,
) -> Result<Option<StagedFile>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(field_name) {
            continue;
        }

        let original_name = field.file_name().unwrap_or("unnamed").to_string();
        let reader = StreamReader::new(
            field.map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err)),
        );

        let staged = state.stager.stage(reader, &original_name).await?;
        info!(
            "{} staged locally at {} ({} bytes)",
            field_name,
            staged.path().display(),
            staged.size_bytes()
        );
        return Ok(Some(staged));
    }

    Ok(None)
}
