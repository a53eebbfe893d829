//! Bookmark endpoint integration tests.
//!
//! Covers listing with pagination and the three protected write routes
//! against an in-memory store.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use anyhow::Result;
use bm_test_utils::TestBookmarkServer;
use bookmark_service::models::Bookmark;
use bookmark_service::repositories::mock::InMemoryStore;
use reqwest::header::ALLOW;
use serde_json::{json, Value};

fn bookmarks(count: i32) -> Vec<Bookmark> {
    (1..=count)
        .map(|id| Bookmark {
            id,
            title: format!("Bookmark {id}"),
            url: format!("https://example.com/{id}"),
        })
        .collect()
}

fn ids(body: &Value, field: &str) -> Vec<i64> {
    body[field]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_i64().unwrap())
        .collect()
}

async fn write_server(count: i32) -> Result<(TestBookmarkServer, String)> {
    let server =
        TestBookmarkServer::spawn(InMemoryStore::new().with_bookmarks(bookmarks(count))).await?;
    let token = server.token_with_permissions(&[
        "post:bookmarks",
        "patch:bookmarks",
        "delete:bookmarks",
    ])?;
    Ok((server, token))
}

// =============================================================================
// GET /bookmarks
// =============================================================================

/// Test that the first page holds five bookmarks.
#[tokio::test]
async fn test_list_first_page() -> Result<()> {
    let server = TestBookmarkServer::spawn(InMemoryStore::new().with_bookmarks(bookmarks(7))).await?;

    let response = reqwest::get(format!("{}/bookmarks", server.url())).await?;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(ids(&body, "bookmarks"), vec![1, 2, 3, 4, 5]);
    assert_eq!(body["bookmarks"][0]["title"], "Bookmark 1");
    assert_eq!(body["bookmarks"][0]["url"], "https://example.com/1");
    Ok(())
}

/// Test that the root path serves the same listing.
#[tokio::test]
async fn test_root_lists_bookmarks() -> Result<()> {
    let server = TestBookmarkServer::spawn(InMemoryStore::new().with_bookmarks(bookmarks(2))).await?;

    let body: Value = reqwest::get(format!("{}/", server.url())).await?.json().await?;

    assert_eq!(ids(&body, "bookmarks"), vec![1, 2]);
    Ok(())
}

/// Test that later pages continue where the previous ended.
#[tokio::test]
async fn test_list_second_page() -> Result<()> {
    let server = TestBookmarkServer::spawn(InMemoryStore::new().with_bookmarks(bookmarks(7))).await?;

    let body: Value = reqwest::get(format!("{}/bookmarks?page=2", server.url()))
        .await?
        .json()
        .await?;

    assert_eq!(ids(&body, "bookmarks"), vec![6, 7]);
    Ok(())
}

/// Test that a page past the end is a 404.
#[tokio::test]
async fn test_list_page_past_end() -> Result<()> {
    let server = TestBookmarkServer::spawn(InMemoryStore::new().with_bookmarks(bookmarks(7))).await?;

    let response = reqwest::get(format!("{}/bookmarks?page=3", server.url())).await?;

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await?;
    assert_eq!(body, json!({"success": false, "error": 404, "message": "not found"}));
    Ok(())
}

/// Test that an empty collection is a 404.
#[tokio::test]
async fn test_list_empty_collection() -> Result<()> {
    let server = TestBookmarkServer::spawn(InMemoryStore::new()).await?;

    let response = reqwest::get(format!("{}/bookmarks", server.url())).await?;

    assert_eq!(response.status(), 404);
    Ok(())
}

/// Test that non-numeric page values fall back to the first page.
#[tokio::test]
async fn test_list_invalid_page_falls_back_to_first() -> Result<()> {
    let server = TestBookmarkServer::spawn(InMemoryStore::new().with_bookmarks(bookmarks(7))).await?;

    for page in ["abc", ""] {
        let body: Value = reqwest::get(format!("{}/bookmarks?page={page}", server.url()))
            .await?
            .json()
            .await?;
        assert_eq!(ids(&body, "bookmarks"), vec![1, 2, 3, 4, 5], "page={page}");
    }
    Ok(())
}

/// Test that zero and negative pages are empty and therefore 404.
#[tokio::test]
async fn test_list_non_positive_page_is_404() -> Result<()> {
    let server = TestBookmarkServer::spawn(InMemoryStore::new().with_bookmarks(bookmarks(7))).await?;

    for page in ["0", "-2"] {
        let response = reqwest::get(format!("{}/bookmarks?page={page}", server.url())).await?;
        assert_eq!(response.status(), 404, "page={page}");
        let body: Value = response.json().await?;
        assert_eq!(body["message"], "not found", "page={page}");
    }
    Ok(())
}

/// Test that a storage failure on read is a generic 500.
#[tokio::test]
async fn test_list_store_failure() -> Result<()> {
    let server = TestBookmarkServer::spawn(InMemoryStore::failing()).await?;

    let response = reqwest::get(format!("{}/bookmarks", server.url())).await?;

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "internal server error");
    Ok(())
}

// =============================================================================
// POST /bookmarks
// =============================================================================

/// Test that creating a bookmark returns it along with the full collection.
#[tokio::test]
async fn test_create_bookmark() -> Result<()> {
    let (server, token) = write_server(6).await?;

    let response = reqwest::Client::new()
        .post(format!("{}/bookmarks", server.url()))
        .bearer_auth(&token)
        .json(&json!({"title": "  Tokio  ", "url": "https://tokio.rs"}))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["created"], json!({"id": 7, "title": "Tokio", "url": "https://tokio.rs"}));
    assert_eq!(ids(&body, "bookmarks"), vec![1, 2, 3, 4, 5, 6, 7]);
    Ok(())
}

/// Test that a created bookmark shows up in later listings.
#[tokio::test]
async fn test_created_bookmark_is_listed() -> Result<()> {
    let (server, token) = write_server(0).await?;

    let response = reqwest::Client::new()
        .post(format!("{}/bookmarks", server.url()))
        .bearer_auth(&token)
        .json(&json!({"title": "Axum", "url": "https://docs.rs/axum"}))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: Value = reqwest::get(format!("{}/bookmarks", server.url()))
        .await?
        .json()
        .await?;
    assert_eq!(body["bookmarks"][0]["title"], "Axum");
    Ok(())
}

/// Test that invalid bodies are rejected with 422.
#[tokio::test]
async fn test_create_invalid_bodies() -> Result<()> {
    let (server, token) = write_server(1).await?;
    let client = reqwest::Client::new();
    let long_title = "t".repeat(256);

    let bodies = [
        "not json".to_string(),
        json!({"url": "https://example.com"}).to_string(),
        json!({"title": "No url"}).to_string(),
        json!({"title": "   ", "url": "https://example.com"}).to_string(),
        json!({"title": 42, "url": "https://example.com"}).to_string(),
        json!({"title": long_title, "url": "https://example.com"}).to_string(),
    ];

    for body in bodies {
        let response = client
            .post(format!("{}/bookmarks", server.url()))
            .bearer_auth(&token)
            .header("Content-Type", "application/json")
            .body(body.clone())
            .send()
            .await?;
        assert_eq!(response.status(), 422, "body: {body}");
        let envelope: Value = response.json().await?;
        assert_eq!(envelope["message"], "unprocessable");
    }
    Ok(())
}

/// Test that a storage failure on write is reported as 422.
#[tokio::test]
async fn test_create_store_failure() -> Result<()> {
    let server = TestBookmarkServer::spawn(InMemoryStore::failing()).await?;
    let token = server.token_with_permissions(&["post:bookmarks"])?;

    let response = reqwest::Client::new()
        .post(format!("{}/bookmarks", server.url()))
        .bearer_auth(&token)
        .json(&json!({"title": "Rust", "url": "https://www.rust-lang.org"}))
        .send()
        .await?;

    assert_eq!(response.status(), 422);
    Ok(())
}

// =============================================================================
// PATCH /bookmarks/:id
// =============================================================================

/// Test that updating a bookmark replaces title and url.
#[tokio::test]
async fn test_update_bookmark() -> Result<()> {
    let (server, token) = write_server(3).await?;

    let response = reqwest::Client::new()
        .patch(format!("{}/bookmarks/2", server.url()))
        .bearer_auth(&token)
        .json(&json!({"title": "Renamed", "url": "https://example.org/renamed"}))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(
        body,
        json!({
            "success": true,
            "bookmark": {"id": 2, "title": "Renamed", "url": "https://example.org/renamed"}
        })
    );
    Ok(())
}

/// Test that updating a missing bookmark is a 404, even with a bad body.
#[tokio::test]
async fn test_update_missing_bookmark() -> Result<()> {
    let (server, token) = write_server(3).await?;

    let response = reqwest::Client::new()
        .patch(format!("{}/bookmarks/99", server.url()))
        .bearer_auth(&token)
        .body("not json")
        .send()
        .await?;

    assert_eq!(response.status(), 404);
    Ok(())
}

/// Test that an existing bookmark with a bad body is a 422.
#[tokio::test]
async fn test_update_invalid_body() -> Result<()> {
    let (server, token) = write_server(3).await?;

    let response = reqwest::Client::new()
        .patch(format!("{}/bookmarks/1", server.url()))
        .bearer_auth(&token)
        .json(&json!({"title": "Only a title"}))
        .send()
        .await?;

    assert_eq!(response.status(), 422);
    Ok(())
}

/// Test that a non-integer id is a 404 once authorized.
#[tokio::test]
async fn test_update_non_integer_id() -> Result<()> {
    let (server, token) = write_server(3).await?;

    let response = reqwest::Client::new()
        .patch(format!("{}/bookmarks/abc", server.url()))
        .bearer_auth(&token)
        .json(&json!({"title": "x", "url": "https://example.com"}))
        .send()
        .await?;

    assert_eq!(response.status(), 404);
    Ok(())
}

// =============================================================================
// DELETE /bookmarks/:id
// =============================================================================

/// Test that deleting returns the id and removes the record.
#[tokio::test]
async fn test_delete_bookmark() -> Result<()> {
    let (server, token) = write_server(2).await?;
    let client = reqwest::Client::new();

    let response = client
        .delete(format!("{}/bookmarks/1", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body, json!({"success": true, "deleted": 1}));

    let listing: Value = reqwest::get(format!("{}/bookmarks", server.url()))
        .await?
        .json()
        .await?;
    assert_eq!(ids(&listing, "bookmarks"), vec![2]);

    let again = client
        .delete(format!("{}/bookmarks/1", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(again.status(), 404);
    Ok(())
}

/// Test that a storage failure on delete is reported as 422.
#[tokio::test]
async fn test_delete_store_failure() -> Result<()> {
    let server = TestBookmarkServer::spawn(InMemoryStore::failing()).await?;
    let token = server.token_with_permissions(&["delete:bookmarks"])?;

    let response = reqwest::Client::new()
        .delete(format!("{}/bookmarks/1", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(response.status(), 422);
    Ok(())
}

// =============================================================================
// Method handling
// =============================================================================

/// Test that an unsupported method on a known path gets the JSON envelope.
#[tokio::test]
async fn test_method_not_allowed() -> Result<()> {
    let server = TestBookmarkServer::spawn(InMemoryStore::new()).await?;
    let client = reqwest::Client::new();

    let response = client
        .put(format!("{}/bookmarks", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), 405);
    assert!(response.headers().get(ALLOW).is_some());
    let body: Value = response.json().await?;
    assert_eq!(
        body,
        json!({"success": false, "error": 405, "message": "method not allowed"})
    );

    let response = client
        .get(format!("{}/bookmarks/1", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), 405);
    Ok(())
}
