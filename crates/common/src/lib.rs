//! Common utilities shared across the bookmark service crates.

#![warn(clippy::pedantic)]

/// Module for JWT utilities (size limits, clock skew bounds, header inspection)
pub mod jwt;
