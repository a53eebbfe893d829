//! JWT claims structure.
//!
//! Contains the claims extracted from verified tokens. The `sub` field is
//! redacted in Debug output to prevent exposure in logs.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// The `aud` claim, which providers emit as either a string or an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    /// Whether `audience` is one of the values.
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(value) => value == audience,
            Audience::Multiple(values) => values.iter().any(|v| v == audience),
        }
    }
}

/// Claims of a verified access token.
///
/// Standard claims are typed; anything else the provider adds lands in
/// `extra` so handlers see the whole payload.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer, `https://{domain}/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Subject (user id) - redacted in Debug output.
    #[serde(default)]
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Expiration timestamp (Unix epoch seconds).
    ///
    /// Presence is enforced by the verifier, so a missing value surfaces as
    /// a claims error instead of a parse error.
    #[serde(default)]
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Authorized party (client id the token was issued to).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,

    /// Space-separated OAuth scopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Permissions granted by the provider's RBAC.
    ///
    /// `None` means the claim is absent, which is distinct from an empty set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BTreeSet<String>>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("iss", &self.iss)
            .field("sub", &"[REDACTED]")
            .field("aud", &self.aud)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("azp", &self.azp)
            .field("scope", &self.scope)
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

impl Claims {
    /// Check if the token grants a specific permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|set| set.contains(permission))
    }
}
