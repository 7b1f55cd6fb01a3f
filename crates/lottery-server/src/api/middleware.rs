//! Request middleware.

use axum::http::HeaderMap;
use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{debug, warn};

/// Declared request body size, if the client sent one. Multipart uploads
/// always do; this is what makes submission sizes visible in the logs.
fn declared_body_bytes(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(axum::http::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Logs every request with its method, path, declared body size, latency,
/// and response status.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let bytes_in = declared_body_bytes(request.headers());
    let start = std::time::Instant::now();

    debug!(%method, %uri, ?bytes_in, "Request started");

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_success() {
        debug!(%method, %uri, %status, ?bytes_in, ?duration, "Request completed");
    } else {
        warn!(%method, %uri, %status, ?bytes_in, ?duration, "Request failed");
    }

    response
}
