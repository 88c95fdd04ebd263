use serde::{Deserialize, Serialize};

/// Success payload for `POST /upload/`.
///
/// `filename` is percent-encoded (the same form used in `url`); `size` is the
/// byte count received, before the transfer to storage; `content_type` is the
/// uploader's declared type, not re-sniffed.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub file_id: String,
    pub filename: String,
    pub size: u64,
    pub content_type: String,
}
