//! HTTP metrics middleware for capturing all request/response metrics
//!
//! Records every response, including those produced before a handler runs
//! (404 from the fallback, 405 from the method router, gate rejections).

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::metrics::record_http_request;

/// Middleware that records HTTP request metrics for all responses.
///
/// Applied as the outermost layer.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status_code = response.status().as_u16();
    record_http_request(&method, &path, status_code, duration);

    response
}
