use axum::{
    Json, Router,
    extract::State,
    http::Method,
    response::Html,
    routing::get,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::page::{ElementPatch, StatusPage, refresh};
use crate::render::{DisplaySettings, PageRenderer};
use crate::status::StatusSource;

pub mod error;

pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn StatusSource>,
    pub renderer: Arc<PageRenderer>,
    pub settings: Arc<DisplaySettings>,
}

async fn load_page(app_state: &AppState) -> Result<StatusPage, AppError> {
    refresh(app_state.source.as_ref(), &app_state.settings)
        .await
        .map_err(|e| {
            error!(error = %e, "Page load failed.");
            AppError::from(e)
        })
}

async fn document_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Html<String>, AppError> {
    let page = load_page(&app_state).await?;
    Ok(Html(app_state.renderer.render_document(&page)?))
}

async fn patches_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<ElementPatch>>, AppError> {
    let page = load_page(&app_state).await?;
    Ok(Json(app_state.renderer.render_patches(&page)?))
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_axum_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(document_handler))
        .route("/api/patches", get(patches_handler))
        .route("/api/health", get(health_check_handler))
        .with_state(Arc::new(app_state))
        .layer(cors)
}
