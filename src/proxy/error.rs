//! Proxy error taxonomy and its HTTP mapping

use hyper::StatusCode;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyError {
    /// Invalid scheme or unusable local path
    #[error("{0}")]
    BadRequest(String),
    /// Local file does not exist
    #[error("{0}")]
    NotFound(String),
    /// Upstream answered non-2xx or could not be reached
    #[error("{0}")]
    BadGateway(String),
    /// Unexpected local failure, e.g. a permission error while reading
    #[error("{0}")]
    Internal(String),
}

impl ProxyError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the response `detail`
    pub fn detail(&self) -> &str {
        match self {
            Self::BadRequest(m) | Self::NotFound(m) | Self::BadGateway(m) | Self::Internal(m) => m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ProxyError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ProxyError::BadGateway("x".into()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ProxyError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_detail_is_message() {
        let err = ProxyError::BadGateway("upstream status 404".into());
        assert_eq!(err.detail(), "upstream status 404");
        assert_eq!(err.to_string(), "upstream status 404");
    }
}
