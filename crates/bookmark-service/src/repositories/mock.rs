//! In-memory [`BookmarkStore`] for tests.

use super::BookmarkStore;
use crate::errors::ApiError;
use crate::models::{Bookmark, Category, NewBookmark};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    bookmarks: Vec<Bookmark>,
    categories: Vec<Category>,
    next_id: i32,
}

/// In-memory store with Postgres-like id assignment.
///
/// A failing store answers every call with `ApiError::Database`.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    fail: bool,
    call_count: AtomicUsize,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose every operation fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Seed bookmarks. Ids continue after the largest seeded id.
    pub fn with_bookmarks(self, bookmarks: Vec<Bookmark>) -> Self {
        let mut tables = self.tables.into_inner();
        tables.next_id = bookmarks.iter().map(|b| b.id).max().unwrap_or(0);
        tables.bookmarks = bookmarks;
        Self {
            tables: RwLock::new(tables),
            ..self
        }
    }

    pub fn with_categories(self, categories: Vec<Category>) -> Self {
        let mut tables = self.tables.into_inner();
        tables.categories = categories;
        Self {
            tables: RwLock::new(tables),
            ..self
        }
    }

    /// Number of store calls made.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), ApiError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ApiError::Database("mock store failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl BookmarkStore for InMemoryStore {
    async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, ApiError> {
        self.enter()?;
        Ok(self.tables.read().await.bookmarks.clone())
    }

    async fn find_bookmark(&self, id: i32) -> Result<Option<Bookmark>, ApiError> {
        self.enter()?;
        let tables = self.tables.read().await;
        Ok(tables.bookmarks.iter().find(|b| b.id == id).cloned())
    }

    async fn insert_bookmark(&self, bookmark: &NewBookmark) -> Result<Bookmark, ApiError> {
        self.enter()?;
        let mut tables = self.tables.write().await;
        tables.next_id = tables.next_id.saturating_add(1);
        let created = Bookmark {
            id: tables.next_id,
            title: bookmark.title.clone(),
            url: bookmark.url.clone(),
        };
        tables.bookmarks.push(created.clone());
        Ok(created)
    }

    async fn update_bookmark(
        &self,
        id: i32,
        bookmark: &NewBookmark,
    ) -> Result<Option<Bookmark>, ApiError> {
        self.enter()?;
        let mut tables = self.tables.write().await;
        let Some(existing) = tables.bookmarks.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        existing.title = bookmark.title.clone();
        existing.url = bookmark.url.clone();
        Ok(Some(existing.clone()))
    }

    async fn delete_bookmark(&self, id: i32) -> Result<bool, ApiError> {
        self.enter()?;
        let mut tables = self.tables.write().await;
        let before = tables.bookmarks.len();
        tables.bookmarks.retain(|b| b.id != id);
        Ok(tables.bookmarks.len() != before)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.enter()?;
        Ok(self.tables.read().await.categories.clone())
    }

    async fn ping(&self) -> Result<(), ApiError> {
        self.enter()
    }
}
