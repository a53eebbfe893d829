//! Category handlers.
//!
//! - `GET /categories?page=N` - List categories (`get:categories`)

use crate::errors::ApiError;
use crate::handlers::bookmarks::page_number;
use crate::models::{paginate, CategoryListResponse, PageQuery};
use crate::routes::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handler for `GET /categories`.
///
/// An empty page is 404.
#[instrument(skip_all, name = "bm.handlers.list_categories")]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<CategoryListResponse>, ApiError> {
    let page = page_number(query);

    let categories = paginate(state.store.list_categories().await?, page);
    if categories.is_empty() {
        tracing::debug!(target: "bm.handlers.categories", page, "Empty category page");
        return Err(ApiError::NotFound);
    }

    Ok(Json(CategoryListResponse {
        success: true,
        categories,
    }))
}
