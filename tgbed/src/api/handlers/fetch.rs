use crate::AppState;
use crate::api::handlers::upload::FILENAME_SET;
use crate::content_type::{guess_mime, image_mime_for_extension};
use crate::errors::{Error, Result};
use crate::telegram::{FetchedFile, TelegramClient, TelegramError};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use percent_encoding::utf8_percent_encode;
use std::sync::Arc;

const CACHE_ONE_YEAR: &str = "public, max-age=31536000";

/// Split a path segment of the form `file_id[.ext[.ext...]]`.
///
/// The identifier is everything before the FIRST dot; the appended extension
/// exists only to make URLs self-descriptive for browsers and CDNs.
/// Identifiers that legitimately contain dots are not supported by this
/// scheme - the identifier format belongs to the origin, so the truncation is
/// kept as-is rather than guessed around.
fn split_file_id(segment: &str) -> (&str, Option<&str>) {
    match segment.split_once('.') {
        Some((id, rest)) => {
            // Only the final extension group is meaningful for content-type guessing
            let ext = rest.rsplit('.').next().filter(|e| !e.is_empty());
            (id, ext)
        }
        None => (segment, None),
    }
}

/// Content type for the image path: prefer what upstream declared, fall back
/// to the extension table.
fn pick_image_content_type(upstream: Option<&str>, ext: Option<&str>) -> String {
    match upstream {
        Some(ct) => ct.to_string(),
        None => image_mime_for_extension(ext.unwrap_or("jpg")).to_string(),
    }
}

/// Get a usable client, rebuilding the handle if it was never established.
fn ready_client(state: &AppState) -> Result<Arc<TelegramClient>> {
    state.storage.ensure_ready().map_err(|e| {
        tracing::error!("failed to rebuild storage client: {e}");
        Error::ServiceUnavailable
    })
}

/// Resolve an identifier and download the object, mapping each failure class
/// to its own error.
async fn resolve_and_download(client: &TelegramClient, file_id: &str) -> Result<FetchedFile> {
    let download_url = client.get_file(file_id).await.map_err(|e| {
        tracing::warn!(file_id = %file_id, "identifier resolution failed: {e}");
        Error::NotFound { message: e.to_string() }
    })?;

    client.fetch_url(&download_url).await.map_err(|e| match e {
        TelegramError::Status { status, body } => Error::Upstream {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: format!("failed to download file: {body}"),
        },
        TelegramError::Read(e) => Error::Upstream {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("error while reading download: {e}"),
        },
        other => Error::Upstream {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("network error while downloading: {other}"),
        },
    })
}

fn file_response(fetched: FetchedFile, content_type: &str, disposition: Option<&str>) -> Response {
    let mut response = Response::new(Body::from(fetched.bytes.clone()));
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type).unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(fetched.bytes.len()));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_ONE_YEAR));
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    if let Some(disposition) = disposition
        && let Ok(value) = HeaderValue::from_str(disposition)
    {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    response
}

/// Handle `GET /image/{file_id}{.ext}`: strip the synthetic extension, resolve
/// the identifier, and serve the bytes inline with a long-lived cache header.
pub async fn get_image(State(state): State<AppState>, Path(segment): Path<String>) -> Result<Response> {
    let (file_id, ext) = split_file_id(&segment);
    tracing::info!(segment = %segment, file_id = %file_id, "image request");

    if file_id.is_empty() {
        return Err(Error::BadRequest {
            message: "file_id must not be empty".to_string(),
        });
    }

    let client = ready_client(&state)?;
    let fetched = resolve_and_download(&client, file_id).await?;

    let content_type = pick_image_content_type(fetched.content_type.as_deref(), ext);
    Ok(file_response(fetched, &content_type, None))
}

/// Handle `GET /file/{file_id}/{filename}`: serve the bytes as an attachment
/// under the original filename. The raw identifier is used as-is here - no
/// synthetic extension was appended on this route.
pub async fn get_file(
    State(state): State<AppState>,
    Path((file_id, filename)): Path<(String, String)>,
) -> Result<Response> {
    tracing::info!(file_id = %file_id, filename = %filename, "file request");

    if file_id.is_empty() {
        return Err(Error::BadRequest {
            message: "file_id must not be empty".to_string(),
        });
    }

    let client = ready_client(&state)?;
    let fetched = resolve_and_download(&client, &file_id).await?;

    // Content type comes from the original filename, not the upstream header.
    let content_type = guess_mime(&filename);
    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        utf8_percent_encode(&filename, FILENAME_SET)
    );

    Ok(file_response(fetched, &content_type, Some(&disposition)))
}
