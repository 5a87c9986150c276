use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::relay::RelayError;
use crate::services::stager::StageError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    MissingFile(&'static str),

    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Staging failed: {0}")]
    Staging(#[from] StageError),

    #[error("Image relay failed: {0}")]
    ImageRelay(RelayError),

    #[error("Video relay failed: {0}")]
    VideoRelay(RelayError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::MissingFile(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": msg }))).into_response()
            }
            AppError::Multipart(e) => {
                (e.status(), Json(json!({ "message": e.body_text() }))).into_response()
            }
            AppError::Staging(StageError::TooLarge { limit }) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({ "message": format!("File exceeds the {limit} byte upload limit") })),
            )
                .into_response(),
            AppError::Staging(StageError::Io(e)) => {
                tracing::error!("staging failed: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to store uploaded file" })),
                )
                    .into_response()
            }
            AppError::ImageRelay(e) => {
                tracing::error!("image relay failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": e.to_string() })),
                )
                    .into_response()
            }
            AppError::VideoRelay(e) => {
                tracing::error!("video relay failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to upload video", "details": e.to_string() })),
                )
                    .into_response()
            }
        }
    }
}
