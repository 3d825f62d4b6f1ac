pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::analysis::handlers as analysis;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

/// Headroom for multipart framing on top of the file size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/analyze-resume", post(analysis::handle_analyze))
        .route(
            "/api/v1/resumes",
            post(resumes::handle_upload)
                .layer(DefaultBodyLimit::max(upload_limit))
                .get(resumes::handle_history),
        )
        .route(
            "/api/v1/resumes/:id/analysis",
            get(resumes::handle_get_analysis),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
