//! Image proxy endpoint: `GET /proxy-image?url=<string>`

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

/// Value of the `url` query parameter, form-decoded
fn url_param(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
}

pub async fn serve(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    let Some(raw_url) = url_param(ctx.query.as_deref()) else {
        return http::build_error_response(StatusCode::BAD_REQUEST, "missing url parameter");
    };

    match state.fetcher.fetch(&raw_url).await {
        Ok(image) => http::build_asset_response(image.body, &image.content_type, ctx.is_head),
        Err(err) => {
            logger::log_debug(&format!("Proxy request for '{raw_url}' failed: {err}"));
            http::build_error_response(err.status(), err.detail())
        }
    }
}
