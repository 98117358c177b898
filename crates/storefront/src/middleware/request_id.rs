//! Request correlation IDs.
//!
//! An `x-request-id` from the reverse proxy is kept when it looks sane;
//! otherwise a UUID v4 is minted. The ID lands in the `http_request` span,
//! on the Sentry scope and in the response headers so a shopper's report can
//! be matched to logs.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// Request ID header, in and out.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Longest inbound request ID we accept before generating our own.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Reuse the inbound ID when printable and reasonably short.
fn resolve_request_id(headers: &HeaderMap) -> String {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_REQUEST_ID_LEN
                && id.bytes().all(|b| b.is_ascii_graphic())
        })
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Tag every request with a correlation ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = resolve_request_id(request.headers());

    Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID.clone(), value);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID.clone(), HeaderValue::from_str(id).unwrap());
        headers
    }

    #[test]
    fn test_keeps_proxy_id() {
        assert_eq!(resolve_request_id(&headers("req-42")), "req-42");
    }

    #[test]
    fn test_generates_when_missing_or_oversized() {
        let generated = resolve_request_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&generated).is_ok());

        let long = "a".repeat(MAX_REQUEST_ID_LEN + 1);
        assert_ne!(resolve_request_id(&headers(&long)), long);
    }

    #[test]
    fn test_rejects_whitespace_inside() {
        let id = resolve_request_id(&headers("two words"));
        assert_ne!(id, "two words");
    }
}
