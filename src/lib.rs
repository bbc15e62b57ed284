pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::image_service::ImageService;
use crate::services::storage::LocalStorage;
use crate::utils::validation::MAX_IMAGE_SIZE;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::images::upload_image,
        api::handlers::images::download_image,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::images::UploadResponse,
        )
    ),
    tags(
        (name = "images", description = "Image upload and retrieval endpoints"),
        (name = "system", description = "Operational endpoints")
    )
)]
pub struct ApiDoc;

/// Framing slack on top of the file limit; a file just over 2 MiB must reach
/// the size check rather than the transport cap.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<LocalStorage>,
    pub image_service: Arc<ImageService>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/api/upload", post(api::handlers::images::upload_image))
        .route(
            "/api/download/:filename",
            get(api::handlers::images::download_image),
        )
        .nest_service("/uploads", ServeDir::new(state.storage.root()))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + MULTIPART_OVERHEAD))
        .with_state(state)
}
