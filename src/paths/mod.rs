//! Untrusted path handling
//!
//! [`sanitize`] cleans raw path strings; [`resolve`] maps the result to a file
//! inside a trusted root. Both the static route and the image proxy's local
//! lookups go through the same pair.

pub mod resolve;
pub mod sanitize;

pub use resolve::{ResolveError, StaticFile, StaticResolver};
pub use sanitize::{percent_decode_lossless, sanitize, sanitize_path, PathRejection, SanitizedPath};
