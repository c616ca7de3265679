//! Request inspection helpers.
//!
//! # Responsibilities
//! - Classify protocol-upgrade requests
//! - Build an absolute URL from the request target
//! - Expose the request ID assigned by the ID layer
//!
//! # Design Decisions
//! - Scheme and host are synthesized; only path and query matter for routing
//! - Upgrade detection mirrors HTTP/1.1: `Connection: upgrade` plus an
//!   `Upgrade` header, whatever the protocol named

use axum::http::{header, HeaderMap, Request};
use url::Url;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

const DEFAULT_HOST: &str = "localhost";

/// True if the request asks to switch protocols.
pub fn is_upgrade_request(headers: &HeaderMap) -> bool {
    let connection_upgrade = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

    connection_upgrade && headers.contains_key(header::UPGRADE)
}

/// Parse the request target against `http://{Host}`.
pub fn request_url<B>(request: &Request<B>) -> Result<Url, url::ParseError> {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or(DEFAULT_HOST);

    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let base = Url::parse(&format!("http://{host}"))?;
    base.join(target)
}

/// The request ID set by the ID layer, or `"unknown"`.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn detects_upgrade() {
        let req = Request::builder()
            .header("Connection", "keep-alive, Upgrade")
            .header("Upgrade", "websocket")
            .body(Body::empty())
            .unwrap();
        assert!(is_upgrade_request(req.headers()));

        let no_upgrade_header = Request::builder()
            .header("Connection", "upgrade")
            .body(Body::empty())
            .unwrap();
        assert!(!is_upgrade_request(no_upgrade_header.headers()));

        let plain = Request::builder().body(Body::empty()).unwrap();
        assert!(!is_upgrade_request(plain.headers()));
    }

    #[test]
    fn url_uses_host_header() {
        let req = Request::builder()
            .uri("/tracks?identifier=abc")
            .header("Host", "node.local:2333")
            .body(Body::empty())
            .unwrap();
        let url = request_url(&req).unwrap();
        assert_eq!(url.host_str(), Some("node.local"));
        assert_eq!(url.port(), Some(2333));
        assert_eq!(url.path(), "/tracks");
        assert_eq!(url.query(), Some("identifier=abc"));
    }

    #[test]
    fn url_defaults_to_localhost() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let url = request_url(&req).unwrap();
        assert_eq!(url.as_str(), "http://localhost/");
    }
}
