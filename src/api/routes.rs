use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::tracking::PixelTracker;

use super::handlers::{health_check, pixel, stats};
use super::static_files::demo_page;

/// Build the tracker router
///
/// `get` routes also answer `HEAD`, which some mail clients use to prefetch
/// images.
pub fn create_router(tracker: PixelTracker) -> Router {
    Router::new()
        .route("/", get(demo_page))
        .route("/health", get(health_check))
        .route("/pixel.gif", get(pixel))
        .route("/{site}/pixel.gif", get(pixel))
        .route("/stats", get(stats))
        .layer(CorsLayer::permissive())
        .with_state(tracker)
}
