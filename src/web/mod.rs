use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::notifications::StructureUpdateNotifier;
use crate::server::config::ServerConfig;

pub mod error;
pub mod models;
pub mod routes;

pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub notifier: Arc<dyn StructureUpdateNotifier>,
    pub config: Arc<ServerConfig>,
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_axum_router(
    db_pool: DatabaseConnection,
    notifier: Arc<dyn StructureUpdateNotifier>,
    config: Arc<ServerConfig>,
) -> Router {
    let max_upload_bytes = config.max_upload_bytes;
    let app_state = Arc::new(AppState {
        db_pool,
        notifier,
        config,
    });

    // Browser clients are served from other origins; mirror them and allow credentials.
    let cors = CorsLayer::very_permissive();

    Router::new()
        .route("/health", get(health_check_handler))
        .merge(routes::structure_routes::create_structure_router(max_upload_bytes))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
