//! Postgres-backed [`BookmarkStore`].
//!
//! All queries are parameterized and timed into `bm_db_query_*` metrics.

use super::BookmarkStore;
use crate::errors::ApiError;
use crate::models::{Bookmark, Category, NewBookmark};
use crate::observability::metrics;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::time::Instant;
use tracing::instrument;

/// Bookmark store over a Postgres pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Record the outcome of a query and convert its error.
fn observe<T>(operation: &str, start: Instant, result: Result<T, sqlx::Error>) -> Result<T, ApiError> {
    let duration = start.elapsed();
    match result {
        Ok(value) => {
            metrics::record_db_query(operation, "success", duration);
            Ok(value)
        }
        Err(e) => {
            metrics::record_db_query(operation, "error", duration);
            tracing::warn!(target: "bm.repo", operation, error = %e, "Query failed");
            Err(ApiError::Database(e.to_string()))
        }
    }
}

fn map_row_to_bookmark(row: &PgRow) -> Result<Bookmark, sqlx::Error> {
    Ok(Bookmark {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        url: row.try_get("url")?,
    })
}

fn map_row_to_category(row: &PgRow) -> Result<Category, sqlx::Error> {
    Ok(Category {
        id: row.try_get("id")?,
        category_type: row.try_get("category_type")?,
        is_important: row.try_get("is_important")?,
    })
}

#[async_trait::async_trait]
impl BookmarkStore for PgStore {
    #[instrument(skip_all, name = "bm.repo.list_bookmarks")]
    async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, ApiError> {
        let start = Instant::now();

        let result = sqlx::query("SELECT id, title, url FROM bookmark ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .and_then(|rows| rows.iter().map(map_row_to_bookmark).collect());

        observe("list_bookmarks", start, result)
    }

    #[instrument(skip_all, name = "bm.repo.find_bookmark", fields(id = id))]
    async fn find_bookmark(&self, id: i32) -> Result<Option<Bookmark>, ApiError> {
        let start = Instant::now();

        let result = sqlx::query("SELECT id, title, url FROM bookmark WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .and_then(|row| row.as_ref().map(map_row_to_bookmark).transpose());

        observe("find_bookmark", start, result)
    }

    #[instrument(skip_all, name = "bm.repo.insert_bookmark")]
    async fn insert_bookmark(&self, bookmark: &NewBookmark) -> Result<Bookmark, ApiError> {
        let start = Instant::now();

        let result = sqlx::query(
            r#"
            INSERT INTO bookmark (title, url)
            VALUES ($1, $2)
            RETURNING id, title, url
            "#,
        )
        .bind(&bookmark.title)
        .bind(&bookmark.url)
        .fetch_one(&self.pool)
        .await
        .and_then(|row| map_row_to_bookmark(&row));

        observe("insert_bookmark", start, result)
    }

    #[instrument(skip_all, name = "bm.repo.update_bookmark", fields(id = id))]
    async fn update_bookmark(
        &self,
        id: i32,
        bookmark: &NewBookmark,
    ) -> Result<Option<Bookmark>, ApiError> {
        let start = Instant::now();

        let result = sqlx::query(
            r#"
            UPDATE bookmark
            SET title = $2, url = $3
            WHERE id = $1
            RETURNING id, title, url
            "#,
        )
        .bind(id)
        .bind(&bookmark.title)
        .bind(&bookmark.url)
        .fetch_optional(&self.pool)
        .await
        .and_then(|row| row.as_ref().map(map_row_to_bookmark).transpose());

        observe("update_bookmark", start, result)
    }

    #[instrument(skip_all, name = "bm.repo.delete_bookmark", fields(id = id))]
    async fn delete_bookmark(&self, id: i32) -> Result<bool, ApiError> {
        let start = Instant::now();

        let result = sqlx::query("DELETE FROM bookmark WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|done| done.rows_affected() > 0);

        observe("delete_bookmark", start, result)
    }

    #[instrument(skip_all, name = "bm.repo.list_categories")]
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let start = Instant::now();

        let result = sqlx::query(
            "SELECT id, category_type, is_important FROM category ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .and_then(|rows| rows.iter().map(map_row_to_category).collect());

        observe("list_categories", start, result)
    }

    #[instrument(skip_all, name = "bm.repo.ping")]
    async fn ping(&self) -> Result<(), ApiError> {
        let start = Instant::now();

        let result = sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ());

        observe("ping", start, result)
    }
}
