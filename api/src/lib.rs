use std::sync::Arc;

mod core;
mod error_handler;
mod middleware_layer;
mod routes;

pub use crate::core::app_state::AppState;
pub use crate::core::http::response_envelope::{ApiError, ApiErrorDetail, ApiResponse};
pub use crate::error_handler::{AppError, AppResult};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{info, warn};

use crate::middleware_layer::json_extractor::json_error_mapper;
use crate::routes::{
    health::health_route::health_route, index_folder::index_folder_route::index_folder_route,
    search::search_route::search_route, upload::upload_route::upload_route,
};

/// Upper bound on an uploaded document.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Builds the HTTP router over the shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_route))
        .route("/search", post(search_route))
        .route("/upload", post(upload_route))
        .route("/index_folder", post(index_folder_route))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

/// Serves the API on `addr` until Ctrl+C.
pub async fn start(state: AppState, addr: &str) -> AppResult<()> {
    let app = router(Arc::new(state));

    // Bind to address
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(AppError::Bind)?;
    info!(%addr, "api: listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("api: stopped");
    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
