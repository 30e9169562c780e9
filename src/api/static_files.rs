use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use mime_guess::from_path;
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "assets"]
pub struct Assets;

/// Serve the demo page that exercises the pixel and stats endpoints
pub async fn demo_page() -> Response {
    serve_embedded("index.html")
}

/// Serve from embedded assets
fn serve_embedded(path: &str) -> Response {
    match Assets::get(path) {
        Some(content) => {
            let mime = from_path(path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                content.data,
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_page_is_embedded() {
        assert!(Assets::get("index.html").is_some());
    }

    #[test]
    fn test_missing_asset_is_not_found() {
        let response = serve_embedded("missing.css");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
