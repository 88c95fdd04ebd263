//! HTTP handlers for the embedded landing page and its assets.

use crate::errors::{Error, Result};
use crate::static_assets::Assets;
use axum::{
    body::Body,
    extract::Path,
    http::{HeaderValue, header},
    response::Response,
};

fn serve(path: &str) -> Result<Response> {
    let content = Assets::get(path).ok_or_else(|| Error::NotFound {
        message: format!("no such asset: {path}"),
    })?;

    let mime = mime_guess::from_path(path).first_or_octet_stream();

    let mut response = Response::new(Body::from(content.data.into_owned()));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime.as_ref()).unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    Ok(response)
}

/// Serve the landing page at `/`.
pub async fn landing_page() -> Result<Response> {
    serve("index.html")
}

/// Serve `/static/{*path}` from the embedded assets.
pub async fn serve_asset(Path(path): Path<String>) -> Result<Response> {
    serve(&path)
}
