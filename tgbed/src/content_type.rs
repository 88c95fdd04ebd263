//! Content-type resolution for the two retrieval paths.
//!
//! The image path uses a fixed extension table; the attachment path uses a
//! general filename guess with explicit binary/text fallbacks. Both are pure
//! and always return a value.

/// MIME type for the image-serving path, keyed on the synthetic URL extension.
///
/// Unknown or missing extensions fall back to `image/jpeg`.
pub fn image_mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

/// MIME type for the attachment-serving path, derived from the original filename.
pub fn guess_mime(filename: &str) -> String {
    if let Some(mime) = mime_guess::from_path(filename).first() {
        return mime.to_string();
    }

    let lower = filename.to_ascii_lowercase();
    if [".exe", ".dll", ".bin"].iter().any(|ext| lower.ends_with(ext)) {
        "application/octet-stream".to_string()
    } else if [".txt", ".log", ".py", ".js", ".html", ".css"].iter().any(|ext| lower.ends_with(ext)) {
        "text/plain".to_string()
    } else {
        "application/octet-stream".to_string()
    }
}
