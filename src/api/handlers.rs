use axum::{
    extract::{rejection::PathRejection, ConnectInfo, Path, Request, State},
    response::Response,
    Json,
};
use serde::Serialize;
use std::collections::HashMap;
use std::net::SocketAddr;

use crate::tracking::{PixelRequest, PixelTracker};

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Serve the tracking pixel
///
/// Route parameters are percent-decoded and optional: the plain `/pixel.gif`
/// route has none and records an empty map.
pub async fn pixel(
    State(tracker): State<PixelTracker>,
    params: Result<Path<HashMap<String, String>>, PathRejection>,
    request: Request,
) -> Response {
    let route_params = params.map(|Path(params)| params).unwrap_or_default();

    // Missing when the router is driven without a listener, e.g. in tests
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();

    let (parts, _body) = request.into_parts();
    let pixel_request = PixelRequest::new(parts.uri, parts.headers)
        .with_remote_addr(remote_addr)
        .with_route_params(route_params);

    tracker.handle_pixel(pixel_request)
}

/// List every captured event
pub async fn stats(State(tracker): State<PixelTracker>) -> Response {
    tracker.handle_stats().await
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
