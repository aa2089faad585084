//! Request handler module
//!
//! Routes requests to the image proxy, the sanitized static tree and the
//! uploads tree.

pub mod proxy_image;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
