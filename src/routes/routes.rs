//! Defines routes for the thumbnail service.
//!
//! ## Structure
//! - `GET  /healthz`, `GET /readyz`: liveness and readiness probes
//! - `POST /api/thumbnail_upload/{video_id}` (also `PUT`): attach a thumbnail
//!   to a video owned by the caller
//! - `GET  /assets/*`: files written by the file-backed thumbnail store

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        thumbnail_handlers::upload_thumbnail,
    },
    services::thumbnail_store::ASSETS_ROUTE,
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::path::Path;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Room for multipart boundaries, part headers and small extra fields on top
/// of the image itself.
pub(crate) const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the router. The request body limit on the upload route sits just
/// above `max_thumbnail_bytes` so oversized images are rejected by the
/// thumbnail store with a 413 rather than by a truncated body.
pub fn routes(max_thumbnail_bytes: usize, assets_root: &Path) -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route(
            "/api/thumbnail_upload/{video_id}",
            post(upload_thumbnail)
                .put(upload_thumbnail)
                .layer(DefaultBodyLimit::max(
                    max_thumbnail_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
                )),
        )
        .nest_service(ASSETS_ROUTE, ServeDir::new(assets_root))
        .layer(TraceLayer::new_for_http())
}
