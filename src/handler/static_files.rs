//! Static file serving module
//!
//! The static route runs every request through the path sanitizer before
//! touching the filesystem. The uploads route only does basic normalization
//! plus a canonical containment check.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, mime};
use crate::logger;
use crate::paths::{sanitize_path, ResolveError};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serve a file from the static root; `raw` is the path after the static prefix
pub async fn serve_static(
    ctx: &RequestContext,
    raw: &str,
    state: &AppState,
) -> Response<Full<Bytes>> {
    let sanitized = sanitize_path(raw);
    logger::log_debug(&format!(
        "Sanitized static request path from '{}' to '{}{}'",
        ctx.path,
        state.config.static_files.prefix_with_slash(),
        sanitized
    ));

    match state.static_resolver.resolve(&sanitized).await {
        Ok(file) => http::build_asset_response(file.content, file.content_type, ctx.is_head),
        Err(ResolveError::NotFound) => http::build_404_response(),
        Err(err) => {
            logger::log_error(&format!(
                "Static lookup failed: {err} (raw: '{raw}', sanitized: '{sanitized}')"
            ));
            http::build_error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

/// Serve a file from the uploads directory; `raw` is the path after the uploads prefix
pub async fn serve_upload(
    ctx: &RequestContext,
    raw: &str,
    uploads_dir: &Path,
) -> Response<Full<Bytes>> {
    match load_from_directory(uploads_dir, raw).await {
        Some((content, content_type)) => {
            http::build_file_response(Bytes::from(content), content_type, ctx.is_head)
        }
        None => http::build_404_response(),
    }
}

/// Decode path segments, refusing `..` instead of resolving it
fn normalize_segments(raw: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for segment in raw.split('/') {
        let decoded = percent_decode_str(segment).decode_utf8_lossy();
        match decoded.as_ref() {
            "" | "." => {}
            ".." => return None,
            s if s.contains(['/', '\\', '\0']) => return None,
            s => relative.push(s),
        }
    }
    Some(relative)
}

/// Load a regular file below `dir`
async fn load_from_directory(dir: &Path, raw: &str) -> Option<(Vec<u8>, &'static str)> {
    let relative = normalize_segments(raw)?;
    if relative.as_os_str().is_empty() {
        return None;
    }

    let dir_canonical = match fs::canonicalize(dir).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Uploads directory not found or inaccessible '{}': {e}",
                dir.display()
            ));
            return None;
        }
    };

    // File not found is common (404), no need to log at warning level
    let file_canonical = fs::canonicalize(dir.join(&relative)).await.ok()?;
    if !file_canonical.starts_with(&dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {raw} -> {}",
            file_canonical.display()
        ));
        return None;
    }
    if !fs::metadata(&file_canonical).await.ok()?.is_file() {
        return None;
    }

    let content = match fs::read(&file_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_canonical.display()
            ));
            return None;
        }
    };

    Some((content, mime::content_type_for_path(&file_canonical)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_segments() {
        assert_eq!(
            normalize_segments("a/./b%20c.txt"),
            Some(PathBuf::from("a/b c.txt"))
        );
        assert_eq!(normalize_segments("a/../b"), None);
        assert_eq!(normalize_segments("%2e%2e/b"), None);
        assert_eq!(normalize_segments("a%2Fb"), None);
        assert_eq!(normalize_segments(""), Some(PathBuf::new()));
    }

    #[tokio::test]
    async fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("audio")).unwrap();
        std::fs::write(dir.path().join("audio/take 1.mp3"), b"mp3").unwrap();

        let (content, content_type) = load_from_directory(dir.path(), "audio/take%201.mp3")
            .await
            .unwrap();
        assert_eq!(content, b"mp3");
        assert_eq!(content_type, "audio/mpeg");

        assert!(load_from_directory(dir.path(), "audio").await.is_none());
        assert!(load_from_directory(dir.path(), "").await.is_none());
        assert!(load_from_directory(dir.path(), "missing.mp3").await.is_none());
    }
}
