//! Safe static file resolution
//!
//! Maps a [`SanitizedPath`] to a regular file inside a fixed root. Both the
//! root and the target are canonicalized before the containment check, so a
//! symlink inside the root cannot point the lookup outside of it.

use std::io;
use std::path::{Path, PathBuf};

use hyper::body::Bytes;
use tokio::fs;

use super::sanitize::SanitizedPath;
use crate::http::mime;
use crate::logger;

/// A file read from disk, ready to be sent
#[derive(Debug, Clone)]
pub struct StaticFile {
    pub path: PathBuf,
    pub content: Bytes,
    pub content_type: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Absent, not a regular file, or outside the root
    #[error("not found")]
    NotFound,
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Resolves sanitized paths against one root directory
#[derive(Debug, Clone)]
pub struct StaticResolver {
    root: PathBuf,
}

impl StaticResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up `path` under the root and read it
    pub async fn resolve(&self, path: &SanitizedPath) -> Result<StaticFile, ResolveError> {
        let Ok(candidate) = path.join_under(&self.root) else {
            return Err(ResolveError::NotFound);
        };

        let root_canonical = match fs::canonicalize(&self.root).await {
            Ok(p) => p,
            Err(e) => {
                logger::log_warning(&format!(
                    "Static root not found or inaccessible '{}': {e}",
                    self.root.display()
                ));
                return Err(ResolveError::NotFound);
            }
        };

        // Missing files are the common 404 case, no need to log
        let Ok(target) = fs::canonicalize(&candidate).await else {
            return Err(ResolveError::NotFound);
        };
        if !target.starts_with(&root_canonical) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {path} -> {}",
                target.display()
            ));
            return Err(ResolveError::NotFound);
        }

        let metadata = fs::metadata(&target).await.map_err(|e| io_error(&target, e))?;
        if !metadata.is_file() {
            return Err(ResolveError::NotFound);
        }

        let content = fs::read(&target).await.map_err(|e| io_error(&target, e))?;
        let content_type = mime::content_type_for_path(&target);

        Ok(StaticFile {
            path: target,
            content: Bytes::from(content),
            content_type,
        })
    }
}

fn io_error(path: &Path, source: io::Error) -> ResolveError {
    if source.kind() == io::ErrorKind::NotFound {
        return ResolveError::NotFound;
    }
    ResolveError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::sanitize_path;

    fn setup() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("shots")).unwrap();
        std::fs::write(dir.path().join("shots/a.png"), b"png-bytes").unwrap();
        std::fs::write(dir.path().join("notes.TXT"), b"hello").unwrap();
        std::fs::write(dir.path().join("blob"), b"raw").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_resolves_existing_file() {
        let dir = setup();
        let resolver = StaticResolver::new(dir.path());
        let file = resolver
            .resolve(&sanitize_path("shots/a.png*---"))
            .await
            .unwrap();
        assert_eq!(&file.content[..], b"png-bytes");
        assert_eq!(file.content_type, "image/png");
        assert!(file.path.ends_with("shots/a.png"));
    }

    #[tokio::test]
    async fn test_content_type_inference() {
        let dir = setup();
        let resolver = StaticResolver::new(dir.path());
        let txt = resolver.resolve(&sanitize_path("notes.TXT")).await.unwrap();
        assert_eq!(txt.content_type, "text/plain; charset=utf-8");
        let blob = resolver.resolve(&sanitize_path("blob")).await.unwrap();
        assert_eq!(blob.content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = setup();
        let resolver = StaticResolver::new(dir.path());
        // "report*---trunc" sanitizes to "report", which does not exist
        assert!(matches!(
            resolver.resolve(&sanitize_path("report*---trunc")).await,
            Err(ResolveError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_directory_is_not_found() {
        let dir = setup();
        let resolver = StaticResolver::new(dir.path());
        assert!(matches!(
            resolver.resolve(&sanitize_path("shots")).await,
            Err(ResolveError::NotFound)
        ));
        assert!(matches!(
            resolver.resolve(&sanitize_path("")).await,
            Err(ResolveError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_traversal_stays_inside_root() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("secret.txt"), b"secret").unwrap();
        let root = outer.path().join("static");
        std::fs::create_dir_all(&root).unwrap();

        let resolver = StaticResolver::new(&root);
        assert!(matches!(
            resolver.resolve(&sanitize_path("../secret.txt")).await,
            Err(ResolveError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_missing_root_is_not_found() {
        let resolver = StaticResolver::new("/nonexistent/imgrelay-root");
        assert!(matches!(
            resolver.resolve(&sanitize_path("a.png")).await,
            Err(ResolveError::NotFound)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escape_is_blocked() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("secret.txt"), b"secret").unwrap();
        let root = outer.path().join("static");
        std::fs::create_dir_all(&root).unwrap();
        std::os::unix::fs::symlink(outer.path().join("secret.txt"), root.join("link.txt"))
            .unwrap();

        let resolver = StaticResolver::new(&root);
        assert!(matches!(
            resolver.resolve(&sanitize_path("link.txt")).await,
            Err(ResolveError::NotFound)
        ));
    }
}
