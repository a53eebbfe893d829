//! Builder patterns for test data construction
//!
//! Provides a fluent API for access token claims.

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

/// Builder for creating test access token claims
///
/// Defaults to a token valid for an hour, issued by `https://{domain}/`
/// for `audience`, with an empty `permissions` claim.
///
/// # Example
/// ```rust,ignore
/// let claims = TestClaimsBuilder::new("tenant.example.com", "bookmark")
///     .with_permissions(&["post:bookmarks"])
///     .expires_in(60)
///     .build();
/// ```
pub struct TestClaimsBuilder {
    claims: Map<String, Value>,
}

impl TestClaimsBuilder {
    /// Create a new claims builder with defaults
    pub fn new(domain: &str, audience: &str) -> Self {
        let now = Utc::now();
        let mut claims = Map::new();
        claims.insert("iss".to_string(), json!(format!("https://{domain}/")));
        claims.insert("sub".to_string(), json!("auth0|test-subject"));
        claims.insert("aud".to_string(), json!(audience));
        claims.insert("iat".to_string(), json!(now.timestamp()));
        claims.insert(
            "exp".to_string(),
            json!((now + Duration::seconds(3600)).timestamp()),
        );
        claims.insert("azp".to_string(), json!("test-client"));
        claims.insert("scope".to_string(), json!("openid profile"));
        claims.insert("permissions".to_string(), json!([]));
        Self { claims }
    }

    /// Set the subject
    pub fn for_user(self, subject: &str) -> Self {
        self.with_claim("sub", json!(subject))
    }

    /// Set the `permissions` claim
    pub fn with_permissions(self, permissions: &[&str]) -> Self {
        self.with_claim("permissions", json!(permissions))
    }

    /// Drop the `permissions` claim entirely
    pub fn without_permissions(self) -> Self {
        self.without_claim("permissions")
    }

    /// Set expiration in seconds from now (negative for the past)
    pub fn expires_in(self, seconds: i64) -> Self {
        let exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self.with_claim("exp", json!(exp))
    }

    /// Make the token valid only from `seconds` in the future
    pub fn not_before_in(self, seconds: i64) -> Self {
        let nbf = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self.with_claim("nbf", json!(nbf))
    }

    /// Set an arbitrary claim
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    /// Remove a claim
    pub fn without_claim(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        Value::Object(self.claims)
    }
}
