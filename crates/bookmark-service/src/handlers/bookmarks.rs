//! Bookmark handlers.
//!
//! - `GET /` and `GET /bookmarks?page=N` - List bookmarks (public)
//! - `POST /bookmarks` - Create bookmark (`post:bookmarks`)
//! - `PATCH /bookmarks/{id}` - Replace title and url (`patch:bookmarks`)
//! - `DELETE /bookmarks/{id}` - Delete bookmark (`delete:bookmarks`)
//!
//! Store failures while reading answer 500; while writing they answer 422.

use crate::auth::Claims;
use crate::errors::ApiError;
use crate::models::{
    paginate, BookmarkListResponse, BookmarkResponse, CreatedBookmarkResponse, DeletedResponse,
    NewBookmark, PageQuery,
};
use crate::routes::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, rejection::QueryRejection, Path, Query, State},
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handler for `GET /` and `GET /bookmarks`.
///
/// An empty page is 404.
#[instrument(skip_all, name = "bm.handlers.list_bookmarks")]
pub async fn list_bookmarks(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<BookmarkListResponse>, ApiError> {
    let page = page_number(query);

    let bookmarks = paginate(state.store.list_bookmarks().await?, page);
    if bookmarks.is_empty() {
        tracing::debug!(target: "bm.handlers.bookmarks", page, "Empty bookmark page");
        return Err(ApiError::NotFound);
    }

    Ok(Json(BookmarkListResponse {
        success: true,
        bookmarks,
    }))
}

/// Handler for `POST /bookmarks`.
///
/// Responds with the new bookmark and the whole collection.
#[instrument(skip_all, name = "bm.handlers.create_bookmark")]
pub async fn create_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    body: Bytes,
) -> Result<Json<CreatedBookmarkResponse>, ApiError> {
    let new_bookmark = NewBookmark::from_body(&body)?;

    let created = state
        .store
        .insert_bookmark(&new_bookmark)
        .await
        .map_err(write_failure)?;
    let bookmarks = state.store.list_bookmarks().await.map_err(write_failure)?;

    tracing::info!(
        target: "bm.handlers.bookmarks",
        id = created.id,
        client = claims.azp.as_deref().unwrap_or("unknown"),
        "Bookmark created"
    );

    Ok(Json(CreatedBookmarkResponse {
        success: true,
        created,
        bookmarks,
    }))
}

/// Handler for `PATCH /bookmarks/{id}`.
///
/// A missing bookmark is 404 even when the body is also invalid.
#[instrument(skip_all, name = "bm.handlers.update_bookmark")]
pub async fn update_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<i32>, PathRejection>,
    body: Bytes,
) -> Result<Json<BookmarkResponse>, ApiError> {
    let id = bookmark_id(id)?;

    if state
        .store
        .find_bookmark(id)
        .await
        .map_err(write_failure)?
        .is_none()
    {
        return Err(ApiError::NotFound);
    }

    let new_bookmark = NewBookmark::from_body(&body)?;

    let bookmark = state
        .store
        .update_bookmark(id, &new_bookmark)
        .await
        .map_err(write_failure)?
        .ok_or(ApiError::NotFound)?;

    tracing::info!(
        target: "bm.handlers.bookmarks",
        id,
        client = claims.azp.as_deref().unwrap_or("unknown"),
        "Bookmark updated"
    );

    Ok(Json(BookmarkResponse {
        success: true,
        bookmark,
    }))
}

/// Handler for `DELETE /bookmarks/{id}`.
#[instrument(skip_all, name = "bm.handlers.delete_bookmark")]
pub async fn delete_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let id = bookmark_id(id)?;

    if !state
        .store
        .delete_bookmark(id)
        .await
        .map_err(write_failure)?
    {
        return Err(ApiError::NotFound);
    }

    tracing::info!(
        target: "bm.handlers.bookmarks",
        id,
        client = claims.azp.as_deref().unwrap_or("unknown"),
        "Bookmark deleted"
    );

    Ok(Json(DeletedResponse {
        success: true,
        deleted: id,
    }))
}

/// Page number from the query; a rejected query string is page 1.
pub(crate) fn page_number(query: Result<Query<PageQuery>, QueryRejection>) -> usize {
    query.map(|Query(q)| q.page_number()).unwrap_or(1)
}

/// A path segment that is not an integer id names no bookmark.
fn bookmark_id(id: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    id.map(|Path(id)| id).map_err(|e| {
        tracing::debug!(target: "bm.handlers.bookmarks", error = %e, "Invalid bookmark id");
        ApiError::NotFound
    })
}

fn write_failure(error: ApiError) -> ApiError {
    match error {
        ApiError::Database(reason) => {
            tracing::error!(target: "bm.handlers.bookmarks", error = %reason, "Bookmark write failed");
            ApiError::Unprocessable(reason)
        }
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_write_failure_maps_database_errors() {
        let mapped = write_failure(ApiError::Database("boom".to_string()));
        assert_eq!(mapped.status_code(), 422);
    }

    #[test]
    fn test_write_failure_keeps_other_errors() {
        assert_eq!(write_failure(ApiError::NotFound).status_code(), 404);
    }
}
