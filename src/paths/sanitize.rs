//! Path sanitization
//!
//! Turns an untrusted path string (URL segment or query value) into a relative
//! path that is legal on both Windows and POSIX filesystems and cannot climb
//! out of the directory it is joined to.
//!
//! The cleaning runs in a fixed order:
//! 1. percent-decode (non-UTF-8 results fall back to the raw input)
//! 2. drop a trailing `*---`
//! 3. cut at the first run of three or more dashes
//! 4. drop trailing asterisks
//! 5. lexical normalization (`.`, `..`, repeated and leading separators)
//! 6. per-segment removal of illegal characters and trailing dots/whitespace
//!
//! Step 6 can expose a new dash run or escape (`a-*--b` becomes `a---b`), so
//! the steps repeat on the joined result until it no longer changes.

use std::fmt;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Characters that are rejected by at least one target filesystem
const ILLEGAL_CHARS: [char; 9] = ['<', '>', ':', '"', '\\', '/', '|', '?', '*'];

/// Suffix emitted by some clients after generated links
const LEGACY_SUFFIX: &str = "*---";

/// Start of a decorative run: everything from here on is dropped
const DASH_RUN: &str = "---";

/// Ordered, filesystem-legal path segments
///
/// No segment is empty, `.` or `..`, and none contains a character from
/// [`ILLEGAL_CHARS`] or an ASCII control character.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SanitizedPath {
    segments: Vec<String>,
}

impl SanitizedPath {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Relative path built from the segments with the platform separator
    pub fn to_relative(&self) -> PathBuf {
        self.segments.iter().collect()
    }

    /// Segments joined with `/`
    pub fn as_url_path(&self) -> String {
        self.segments.join("/")
    }

    /// Resolve under `root`, checking the result stays inside it
    pub fn join_under(&self, root: &Path) -> Result<PathBuf, PathRejection> {
        if self.is_empty() {
            return Err(PathRejection::Empty);
        }
        let target = root.join(self.to_relative());
        if target.starts_with(root) {
            Ok(target)
        } else {
            Err(PathRejection::Traversal)
        }
    }
}

impl fmt::Display for SanitizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_url_path())
    }
}

/// Why a raw path could not be mapped under a root
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PathRejection {
    /// Nothing left after sanitization
    #[error("empty path")]
    Empty,
    #[error("traversal")]
    Traversal,
}

/// Sanitize `raw` and resolve it under `root`
pub fn sanitize(raw: &str, root: &Path) -> Result<PathBuf, PathRejection> {
    sanitize_path(raw).join_under(root)
}

/// Sanitize `raw` into path segments. Never fails; the result may be empty.
pub fn sanitize_path(raw: &str) -> SanitizedPath {
    let mut path = sanitize_pass(raw);
    // Each pass that changes the output shortens it or turns `\` into `/`
    loop {
        let next = sanitize_pass(&path.as_url_path());
        if next == path {
            return path;
        }
        path = next;
    }
}

fn sanitize_pass(raw: &str) -> SanitizedPath {
    let decoded = percent_decode_lossless(raw);
    let trimmed = strip_decorations(&decoded);

    let segments = normalize(trimmed)
        .into_iter()
        .map(clean_segment)
        .filter(|s| !s.is_empty())
        .collect();

    SanitizedPath { segments }
}

/// Percent-decode, returning the input unchanged when the bytes are not UTF-8
pub fn percent_decode_lossless(raw: &str) -> String {
    percent_decode_str(raw)
        .decode_utf8()
        .map_or_else(|_| raw.to_string(), std::borrow::Cow::into_owned)
}

/// Steps 2-4: legacy suffix, dash runs and trailing asterisks
fn strip_decorations(path: &str) -> &str {
    let path = path.strip_suffix(LEGACY_SUFFIX).unwrap_or(path);
    let path = path.find(DASH_RUN).map_or(path, |idx| &path[..idx]);
    path.trim_end_matches('*')
}

/// Lexical normalization over `/` and `\` separators
///
/// `..` pops the previous segment; at the top it is dropped, so the result
/// never starts above the directory it is later joined to.
fn normalize(path: &str) -> Vec<&str> {
    let mut stack: Vec<&str> = Vec::new();
    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    stack
}

fn clean_segment(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_ascii_control())
        .collect();
    cleaned
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(raw: &str) -> String {
        sanitize_path(raw).as_url_path()
    }

    #[test]
    fn test_plain_path_is_unchanged() {
        assert_eq!(clean("screenshots/a.png"), "screenshots/a.png");
        assert_eq!(clean("/screenshots//a.png"), "screenshots/a.png");
    }

    #[test]
    fn test_percent_decoding() {
        assert_eq!(clean("my%20file.png"), "my file.png");
        assert_eq!(clean("%E5%9B%BE.png"), "图.png");
    }

    #[test]
    fn test_invalid_utf8_falls_back_to_raw() {
        // %FF decodes to a lone byte; the raw string is used instead
        assert_eq!(clean("a%FF.png"), "a%FF.png");
        // stray percent signs are kept
        assert_eq!(clean("100%.png"), "100%.png");
    }

    #[test]
    fn test_legacy_suffix() {
        assert_eq!(clean("shot.png*---"), "shot.png");
        assert_eq!(clean("shot.png%2A---"), "shot.png");
    }

    #[test]
    fn test_dash_run_drops_rest() {
        assert_eq!(clean("report*---trunc"), "report");
        assert_eq!(clean("a.png---#anchor/more"), "a.png");
        assert_eq!(clean("a.png-----"), "a.png");
        // two dashes are part of a name
        assert_eq!(clean("a--b.png"), "a--b.png");
    }

    #[test]
    fn test_trailing_asterisks() {
        assert_eq!(clean("a.png***"), "a.png");
    }

    #[test]
    fn test_illegal_characters_removed() {
        assert_eq!(clean("a<b>c:d\"e|f?g.png"), "abcdefg.png");
        assert_eq!(clean("x%3C%3E%3A.png"), "x.png");
        assert_eq!(clean("a\u{0}b.png"), "ab.png");
        let path = sanitize_path("d<i>r/f:i|l?e*.txt");
        for segment in path.segments() {
            assert!(!segment.contains(ILLEGAL_CHARS));
        }
    }

    #[test]
    fn test_trailing_dots_and_spaces() {
        assert_eq!(clean("dir. /name.png . "), "dir/name.png");
        assert_eq!(clean(".hidden"), ".hidden");
    }

    #[test]
    fn test_segments_that_become_empty_are_dropped() {
        assert_eq!(clean("a/***/b"), "a/b");
        assert_eq!(clean("a/ . /b"), "a/b");
        assert_eq!(clean("::/file"), "file");
    }

    #[test]
    fn test_traversal_is_neutralized() {
        assert_eq!(clean("../../etc/passwd"), "etc/passwd");
        assert_eq!(clean("a/../../b"), "b");
        assert_eq!(clean("a/b/../c"), "a/c");
        assert_eq!(clean("..\\..\\windows\\win.ini"), "windows/win.ini");
        assert_eq!(clean("%2e%2e/%2e%2e/etc/passwd"), "etc/passwd");
        assert_eq!(clean(".../x"), "x");
    }

    #[test]
    fn test_sanitize_stays_under_root() {
        let root = Path::new("/srv/static");
        for raw in [
            "../../etc/passwd",
            "/../../../etc/passwd",
            "..%2F..%2Fetc%2Fpasswd",
            "a/../../..",
            "..\\..\\boot.ini",
            "....//....//x",
        ] {
            match sanitize(raw, root) {
                Ok(p) => assert!(p.starts_with(root), "{raw} escaped to {}", p.display()),
                Err(e) => assert_eq!(e, PathRejection::Empty, "{raw}"),
            }
        }
    }

    #[test]
    fn test_empty_result_is_rejected() {
        let root = Path::new("/srv/static");
        assert_eq!(sanitize("", root), Err(PathRejection::Empty));
        assert_eq!(sanitize("---junk", root), Err(PathRejection::Empty));
        assert_eq!(sanitize("../..", root), Err(PathRejection::Empty));
        assert_eq!(sanitize("***", root), Err(PathRejection::Empty));
    }

    #[test]
    fn test_sanitize_joins_under_root() {
        let root = Path::new("/srv/static");
        assert_eq!(
            sanitize("shots/a.png*---", root).unwrap(),
            root.join("shots").join("a.png")
        );
    }

    #[test]
    fn test_idempotent() {
        for raw in [
            "report*---trunc",
            "../../etc/passwd",
            "d<i>r/f:i|l?e*.txt",
            "a/b/./c/../d.png",
            "my%20file.png---x",
            "dir. /name.png . ",
            "a-*--b.png",
            "a-:--b.png",
            "a%2:0b.png",
            "x/%2%3A5%3A2e%2%3A5%3A2e/y",
            "a.png*:*:---",
        ] {
            let once = clean(raw);
            assert_eq!(clean(&once), once, "{raw}");
        }
    }

    #[test]
    fn test_removed_characters_do_not_hide_decorations() {
        // an illegal character splitting a dash run or an escape
        assert_eq!(clean("a-*--b.png"), "a");
        assert_eq!(clean("a-:--b.png"), "a");
        assert_eq!(clean("a%2:0b.png"), "a b.png");
    }
}
