//! Middleware for the bookmark service.
//!
//! # Components
//!
//! - `auth` - Permission gate for protected route groups
//! - `envelope` - JSON error envelope for framework-generated rejections
//! - `http_metrics` - HTTP request metrics middleware

pub mod auth;
pub mod envelope;
pub mod http_metrics;

pub use auth::{require_permission, GateState};
pub use envelope::error_envelope_middleware;
pub use http_metrics::http_metrics_middleware;
