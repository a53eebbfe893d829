//! Bookmark Service Library
//!
//! A small bookmarking API: public bookmark listing, and bookmark and
//! category operations gated by access tokens from an external identity
//! provider.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> handlers/*.rs -> repositories/*.rs
//!                        |
//!                        v
//!                  auth/gate.rs -> auth/{header, jwt, jwks, permissions}.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Bearer token extraction, JWKS-backed verification, permission checks
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Permission gate, error envelope, HTTP metrics
//! - `models` - Records, request bodies, response envelopes
//! - `observability` - Prometheus metrics
//! - `repositories` - `BookmarkStore` and its Postgres and in-memory implementations
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
