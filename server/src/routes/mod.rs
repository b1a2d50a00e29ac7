//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the quote API, the material catalog, and static media under a
//! single Axum router. Uploaded plan images are served back at `/media`.

pub mod materials;
pub mod quotes;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Multipart envelope headroom on top of the 10 MB image bound.
const UPLOAD_BODY_LIMIT: usize = 12 * 1024 * 1024;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let media_service = ServeDir::new(&state.media_dir);

    Router::new()
        .route("/api/quotes", get(quotes::list).post(quotes::create))
        .route("/api/quotes/{id}", get(quotes::get_one))
        .route("/api/quotes/{id}/upload", post(quotes::upload))
        .route("/api/quotes/{id}/process", post(quotes::process))
        .route("/api/quotes/{id}/status", get(quotes::extraction_status))
        .route("/api/quotes/{id}/dimensions", patch(quotes::update_dimensions))
        .route("/api/quotes/{id}/obstacles", patch(quotes::update_obstacles))
        .route("/api/quotes/{id}/calculate", post(quotes::calculate))
        .route(
            "/api/quotes/{id}/offer",
            post(quotes::generate_offer).get(quotes::download_offer),
        )
        .route("/api/quotes/{id}/duplicate", post(quotes::duplicate))
        .route("/api/materials", get(materials::list))
        .route("/healthz", get(healthz))
        .nest_service("/media", media_service)
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
