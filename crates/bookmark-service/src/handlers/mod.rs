//! HTTP request handlers for the bookmark service.

pub mod bookmarks;
pub mod categories;
pub mod health;
pub mod metrics;

pub use bookmarks::{create_bookmark, delete_bookmark, list_bookmarks, update_bookmark};
pub use categories::list_categories;
pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;

use crate::errors::ApiError;

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
