pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::storage::ObjectStorage;
use crate::utils::validation::UploadPolicy;
use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::files::api_files,
        api::handlers::files::api_stats,
        api::handlers::files::upload_file,
        api::handlers::files::download_file,
        api::handlers::files::delete_file,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            models::AssetRecord,
            models::CatalogEntry,
            models::CatalogStats,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "files", description = "File management endpoints"),
        (name = "system", description = "System endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn ObjectStorage>,
    pub policy: UploadPolicy,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::handlers::files::index))
        .route("/upload", post(api::handlers::files::upload_file))
        .route("/download/:reference", get(api::handlers::files::download_file))
        .route("/delete/:reference", post(api::handlers::files::delete_file))
        .route("/api/files", get(api::handlers::files::api_files))
        .route("/api/stats", get(api::handlers::files::api_stats))
        .route("/health", get(api::handlers::health::health_check))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
