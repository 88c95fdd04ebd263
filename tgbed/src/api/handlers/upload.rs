use crate::AppState;
use crate::api::models::files::UploadResponse;
use crate::errors::{Error, Result};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode, header},
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

/// Percent-encoding set for filenames placed in a URL path segment.
/// Keeps unreserved characters and `/`, mirroring urllib's `quote` defaults.
pub(crate) const FILENAME_SET: &percent_encoding::AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// The framework body limit can trip while the multipart stream is being
/// read; report that as the same size error the handler's own ceiling check
/// produces, so clients see one message for oversized uploads.
fn multipart_error(e: MultipartError, max_upload_bytes: u64) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge {
            limit_mib: max_upload_bytes / (1024 * 1024),
        }
    } else {
        Error::BadRequest {
            message: format!("failed to parse multipart data: {e}"),
        }
    }
}

/// Handle `POST /upload/`: validate the multipart upload, forward it to the
/// Telegram channel, and answer with a stable retrieval URL.
pub async fn upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    // When no password is configured the header is ignored entirely.
    if let Some(password) = &state.config.upload_password {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(Error::Unauthenticated)?;
        if authorization != format!("Bearer {password}") {
            return Err(Error::Forbidden);
        }
    }

    // Uploads never lazily rebuild the handle; that fallback is reserved for
    // the retrieval path.
    let client = state.storage.get().ok_or(Error::ServiceUnavailable)?;

    let mut upload: Option<(String, String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, state.config.max_upload_bytes))?
    {
        if field.name() != Some("file") {
            // Ignore unknown fields (forward compatibility)
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, state.config.max_upload_bytes))?;

        upload = Some((filename, content_type, data.to_vec()));
    }

    let (filename, content_type, data) = upload.ok_or_else(|| Error::BadRequest {
        message: "missing required field: 'file'".to_string(),
    })?;

    let size = data.len() as u64;
    tracing::info!(filename = %filename, size, content_type = %content_type, "received upload");

    // Strict greater-than: a body of exactly the ceiling is accepted.
    if size > state.config.max_upload_bytes {
        return Err(Error::PayloadTooLarge {
            limit_mib: state.config.max_upload_bytes / (1024 * 1024),
        });
    }

    let file_id = if content_type.starts_with("image/") {
        client.send_photo(data).await
    } else {
        client.send_document(data, &filename).await
    }
    .map_err(Error::Storage)?;

    tracing::info!(file_id = %file_id, "upload stored");

    let safe_filename = utf8_percent_encode(&filename, FILENAME_SET).to_string();
    let url = format!("{}/file/{}/{}", state.config.base_url, file_id, safe_filename);

    Ok(Json(UploadResponse {
        success: true,
        url,
        file_id,
        filename: safe_filename,
        size,
        content_type,
    }))
}
