pub mod api;
pub mod config;
pub mod infrastructure;
pub mod services;

use crate::config::UploadConfig;
use crate::services::relay::MediaRelay;
use crate::services::stager::LocalStager;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::data::list_data,
        api::handlers::data::receive_data,
        api::handlers::upload::upload_image,
        api::handlers::upload::upload_video,
    ),
    components(
        schemas(
            api::handlers::data::SampleRecord,
            api::handlers::upload::ImageUploadResponse,
            api::handlers::upload::VideoUploadResponse,
        )
    ),
    tags(
        (name = "data", description = "Sample data endpoints"),
        (name = "upload", description = "Media upload endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub stager: Arc<LocalStager>,
    pub relay: Arc<dyn MediaRelay>,
    pub config: UploadConfig,
}

pub fn create_app(state: AppState) -> Router {
    let scratch_dir = state.config.scratch_dir.clone();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route(
            "/api/data",
            get(api::handlers::data::list_data).post(api::handlers::data::receive_data),
        )
        .route("/api/upload", post(api::handlers::upload::upload_image))
        .route(
            "/api/upload-video",
            post(api::handlers::upload::upload_video),
        )
        // The scratch directory is served statically at the root.
        .fallback_service(ServeDir::new(scratch_dir))
        .with_state(state)
}
