//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation, route matching, and dispatching.

use crate::config::AppState;
use crate::handler::{proxy_image, static_files};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SERVER};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

/// Request context encapsulating information needed for request processing
pub struct RequestContext {
    pub path: String,
    pub query: Option<String>,
    pub is_head: bool,
}

impl RequestContext {
    fn from_parts(parts: &Parts) -> Self {
        Self {
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(ToString::to_string),
            is_head: parts.method == Method::HEAD,
        }
    }
}

/// Main entry point for HTTP request handling
///
/// The request body is never read; every route is GET/HEAD.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let mut entry = AccessLogEntry::start(&req, remote_addr);
    let (parts, _) = req.into_parts();

    let mut response = match check_request(&parts, &state) {
        Some(resp) => resp,
        None => route_request(&RequestContext::from_parts(&parts), &state).await,
    };
    if let Ok(server_name) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server_name);
    }

    if state.config.logging.access_log {
        let size = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.complete(response.status().as_u16(), size);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Method and body size checks, returning an early response when they fail
fn check_request(parts: &Parts, state: &AppState) -> Option<Response<Full<Bytes>>> {
    check_http_method(&parts.method, state.config.http.enable_cors)
        .or_else(|| check_body_size(parts, state.config.http.max_body_size))
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(parts: &Parts, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = parts.headers.get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            _ => None,
        },
    )
}

/// Route request based on path and configuration
async fn route_request(ctx: &RequestContext, state: &Arc<AppState>) -> Response<Full<Bytes>> {
    let config = &state.config;

    // 0. Health check (highest priority, always fast)
    if config.health.enabled && ctx.path == config.health.path {
        return http::build_health_response("ok");
    }

    // 1. Image proxy
    if ctx.path == config.proxy.route {
        return proxy_image::serve(ctx, state).await;
    }

    // 2. Sanitized static files
    if let Some(raw) = ctx.path.strip_prefix(&config.static_files.prefix_with_slash()) {
        return static_files::serve_static(ctx, raw, state).await;
    }

    // 3. Uploads
    if let Some(raw) = ctx
        .path
        .strip_prefix(&config.static_files.uploads_prefix_with_slash())
    {
        return static_files::serve_upload(ctx, raw, &config.static_files.uploads_dir).await;
    }

    http::build_404_response()
}
