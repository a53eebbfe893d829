//! Metrics definitions for the bookmark service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `bm_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: HTTP methods
//! - `endpoint`: parameterized paths, unknown paths collapse to `/other`
//! - `status`: success, error, timeout
//! - `error_code`: bounded by `AuthError` variants
//! - `operation`: bounded by the store's queries

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("bm_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("bm_db_query".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.020, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set DB query buckets: {e}"))?
        // JWKS fetches leave the cluster, so the range reaches the fetch timeout
        .set_buckets_for_metric(
            Matcher::Prefix("bm_jwks_fetch".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set JWKS fetch buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `bm_http_requests_total`, `bm_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// Captures framework-level responses (404, 405) as well as handler output.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("bm_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("bm_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion.
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/" | "/health" | "/ready" | "/metrics" | "/bookmarks" | "/categories" => {
            path.to_string()
        }
        _ => normalize_dynamic_endpoint(path),
    }
}

/// Replaces bookmark ids with a placeholder.
fn normalize_dynamic_endpoint(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("/bookmarks/") {
        if !rest.is_empty() && !rest.contains('/') {
            return "/bookmarks/{id}".to_string();
        }
    }

    "/other".to_string()
}

// ============================================================================
// Authorization Metrics
// ============================================================================

/// Record a token verification outcome
///
/// Metric: `bm_token_validations_total`
/// Labels: `status`, `error_code`
pub fn record_token_validation(status: &str, error_code: Option<&str>) {
    counter!("bm_token_validations_total",
        "status" => status.to_string(),
        "error_code" => error_code.unwrap_or("none").to_string()
    )
    .increment(1);
}

/// Record a JWKS fetch
///
/// Metric: `bm_jwks_fetch_total`, `bm_jwks_fetch_duration_seconds`
/// Labels: `status`
pub fn record_jwks_fetch(status: &str, duration: Duration) {
    histogram!("bm_jwks_fetch_duration_seconds").record(duration.as_secs_f64());

    counter!("bm_jwks_fetch_total",
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Database Metrics
// ============================================================================

/// Record database query execution
///
/// Metric: `bm_db_queries_total`, `bm_db_query_duration_seconds`
/// Labels: `operation`, `status`
pub fn record_db_query(operation: &str, status: &str, duration: Duration) {
    histogram!("bm_db_query_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("bm_db_queries_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
