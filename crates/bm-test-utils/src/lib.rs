//! # Bookmark Service Test Utilities
//!
//! This crate provides:
//! - Deterministic signing keys with matching JWKs (`crypto_fixtures`)
//! - Claims builders for access tokens (`token_builders`)
//! - Server test harness with a mocked JWKS endpoint (`server_harness`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bm_test_utils::*;
//! use bookmark_service::repositories::mock::InMemoryStore;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestBookmarkServer::spawn(InMemoryStore::new()).await?;
//!     let token = server.token_with_permissions(&["get:categories"])?;
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/categories", server.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 404);
//!     Ok(())
//! }
//! ```

pub mod crypto_fixtures;
pub mod server_harness;
pub mod token_builders;

pub use crypto_fixtures::*;
pub use server_harness::*;
pub use token_builders::*;
