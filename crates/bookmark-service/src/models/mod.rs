//! Bookmark service models.
//!
//! Records as stored and as sent over the wire, request bodies, and
//! response envelopes.

use crate::errors::ApiError;
use serde::{Deserialize, Serialize};

/// Number of records per page on list endpoints.
pub const ITEMS_PER_PAGE: usize = 5;

/// Maximum title length in characters.
pub const MAX_TITLE_LENGTH: usize = 255;

/// Maximum URL length in characters.
pub const MAX_URL_LENGTH: usize = 2048;

/// A bookmarked URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i32,
    pub title: String,
    pub url: String,
}

/// A bookmark category and whether it is important to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i32,

    #[serde(rename = "type")]
    pub category_type: String,

    #[serde(rename = "important")]
    pub is_important: bool,
}

/// Validated `{title, url}` body for create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct BookmarkRequest {
    title: Option<String>,
    url: Option<String>,
}

impl NewBookmark {
    /// Parse and validate a request body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unprocessable` for malformed JSON, a missing or
    /// non-string field, or a blank or overlong value.
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        let request: BookmarkRequest = serde_json::from_slice(body)
            .map_err(|e| ApiError::Unprocessable(format!("invalid body: {e}")))?;

        let title = required_field("title", request.title, MAX_TITLE_LENGTH)?;
        let url = required_field("url", request.url, MAX_URL_LENGTH)?;

        Ok(Self { title, url })
    }
}

fn required_field(name: &str, value: Option<String>, max_len: usize) -> Result<String, ApiError> {
    let value = value.ok_or_else(|| ApiError::Unprocessable(format!("{name} is required")))?;
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ApiError::Unprocessable(format!("{name} is empty")));
    }
    if trimmed.chars().count() > max_len {
        return Err(ApiError::Unprocessable(format!(
            "{name} exceeds {max_len} characters"
        )));
    }

    Ok(trimmed.to_string())
}

/// `?page=N` query.
///
/// Kept as a string so an unparseable value falls back to the first page
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// One-based page number. A value that is not an integer is page 1;
    /// zero or a negative integer maps to 0, which no page matches.
    pub fn page_number(&self) -> usize {
        let Some(raw) = self.page.as_deref() else {
            return 1;
        };
        match raw.trim().parse::<i64>() {
            Ok(p) if p < 1 => 0,
            Ok(p) => usize::try_from(p).unwrap_or(usize::MAX),
            Err(_) => 1,
        }
    }
}

/// Slice `items` to one page. Page 0 is always empty.
pub fn paginate<T>(items: Vec<T>, page: usize) -> Vec<T> {
    if page == 0 {
        return Vec::new();
    }
    let start = (page - 1).saturating_mul(ITEMS_PER_PAGE);
    items.into_iter().skip(start).take(ITEMS_PER_PAGE).collect()
}

#[derive(Debug, Serialize)]
pub struct BookmarkListResponse {
    pub success: bool,
    pub bookmarks: Vec<Bookmark>,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub success: bool,
    pub categories: Vec<Category>,
}

/// Response to `POST /bookmarks`: the new record plus the full collection.
#[derive(Debug, Serialize)]
pub struct CreatedBookmarkResponse {
    pub success: bool,
    pub created: Bookmark,
    pub bookmarks: Vec<Bookmark>,
}

#[derive(Debug, Serialize)]
pub struct BookmarkResponse {
    pub success: bool,
    pub bookmark: Bookmark,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub deleted: i32,
}

/// Readiness check response.
///
/// Returned by the `/ready` endpoint (readiness check).
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    /// "ready" or "not_ready".
    pub status: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,

    /// Error message (generic, no infrastructure details).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
