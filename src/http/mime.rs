//! MIME type detection module
//!
//! Returns the corresponding Content-Type based on file extension.

use std::path::Path;

/// Fallback for unknown or missing extensions
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Get MIME Content-Type based on a lowercase file extension
///
/// # Examples
/// ```
/// use imgrelay::http::mime::get_content_type;
/// assert_eq!(get_content_type(Some("webp")), "image/webp");
/// assert_eq!(get_content_type(None), "application/octet-stream");
/// ```
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    match extension {
        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("bmp") => "image/bmp",

        // Text
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("json") => "application/json",
        Some("js" | "mjs") => "application/javascript",

        // Media
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",

        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",

        _ => OCTET_STREAM,
    }
}

/// Content-Type for a file path, matching the extension case-insensitively
pub fn content_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    get_content_type(extension.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_types() {
        assert_eq!(get_content_type(Some("png")), "image/png");
        assert_eq!(get_content_type(Some("jpeg")), "image/jpeg");
        assert_eq!(get_content_type(Some("svg")), "image/svg+xml");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(get_content_type(Some("xyz")), OCTET_STREAM);
        assert_eq!(get_content_type(None), OCTET_STREAM);
    }

    #[test]
    fn test_path_lookup_ignores_case() {
        assert_eq!(content_type_for_path(Path::new("a/B.JPG")), "image/jpeg");
        assert_eq!(content_type_for_path(Path::new("report")), OCTET_STREAM);
    }
}
