//! JWT utilities that run before any key material is involved.
//!
//! - Size limits for DoS prevention
//! - Clock skew bounds for expiry leeway configuration
//! - Unverified header inspection (`kid` lookup)
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Nothing here verifies a signature. A header read by [`inspect_header`]
//!   is only good for choosing which published key to verify with.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Identity provider access tokens are typically 800-1500 bytes. Anything
/// beyond this limit is rejected before base64 decoding.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Maximum allowed clock skew tolerance (10 minutes).
///
/// Upper bound for the expiry leeway a deployment may configure.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

// =============================================================================
// Error Types
// =============================================================================

/// Errors produced while inspecting a token header.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("Token exceeds {MAX_JWT_SIZE_BYTES} bytes")]
    TokenTooLarge,

    /// Token is not a three-segment JWT with a base64url JSON header.
    #[error("Token is not a well-formed JWT")]
    MalformedToken,

    /// Token header has no usable `kid`.
    #[error("Token header has no key identifier")]
    MissingKid,
}

// =============================================================================
// Header Types
// =============================================================================

/// Header fields read from a token before its signature is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnverifiedHeader {
    /// Key identifier naming the published key that signed the token.
    pub kid: String,

    /// Algorithm the token claims to be signed with.
    pub alg: Option<String>,
}

#[derive(Deserialize)]
struct RawHeader {
    #[serde(default)]
    kid: Option<serde_json::Value>,
    #[serde(default)]
    alg: Option<String>,
}

// =============================================================================
// Functions
// =============================================================================

/// Read the header of a JWT without verifying the signature.
///
/// # Errors
///
/// - `TokenTooLarge` - token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - `MalformedToken` - wrong segment count, bad base64, or header is not a JSON object
/// - `MissingKid` - `kid` absent, empty, or not a string
pub fn inspect_header(token: &str) -> Result<UnverifiedHeader, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let mut segments = token.split('.');
    let (Some(header_part), Some(_), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        tracing::debug!(target: "common.jwt", "Token rejected: expected three segments");
        return Err(JwtValidationError::MalformedToken);
    };

    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let raw: RawHeader = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    let kid = raw
        .kid
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingKid)?;

    Ok(UnverifiedHeader { kid, alg: raw.alg })
}
