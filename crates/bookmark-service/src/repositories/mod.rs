//! Persistence layer for bookmarks and categories.
//!
//! Handlers talk to a [`BookmarkStore`]; [`PgStore`] is the Postgres
//! implementation and [`mock::InMemoryStore`] backs tests.

pub mod mock;
pub mod postgres;

pub use postgres::PgStore;

use crate::errors::ApiError;
use crate::models::{Bookmark, Category, NewBookmark};

/// Storage operations used by the HTTP handlers.
///
/// All failures are reported as `ApiError::Database`.
#[async_trait::async_trait]
pub trait BookmarkStore: Send + Sync {
    /// All bookmarks ordered by id.
    async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, ApiError>;

    async fn find_bookmark(&self, id: i32) -> Result<Option<Bookmark>, ApiError>;

    async fn insert_bookmark(&self, bookmark: &NewBookmark) -> Result<Bookmark, ApiError>;

    /// Replace title and url. Returns `None` if no bookmark has `id`.
    async fn update_bookmark(
        &self,
        id: i32,
        bookmark: &NewBookmark,
    ) -> Result<Option<Bookmark>, ApiError>;

    /// Returns `false` if no bookmark has `id`.
    async fn delete_bookmark(&self, id: i32) -> Result<bool, ApiError>;

    /// All categories ordered by id.
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;

    /// Cheap connectivity check for readiness checks.
    async fn ping(&self) -> Result<(), ApiError>;
}
