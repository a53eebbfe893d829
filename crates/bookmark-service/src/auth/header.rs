//! Bearer token extraction from the `Authorization` header.

use crate::errors::{AuthError, BEARER_SCHEME_REQUIRED, BEARER_TOKEN_REQUIRED, TOKEN_NOT_FOUND};

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively and parts are split on any
/// whitespace. Nothing here touches the network.
///
/// # Errors
///
/// - `MissingHeader` - header absent or empty
/// - `MalformedHeader` - wrong scheme, no token, or extra parts
pub fn extract_bearer_token(authorization: Option<&str>) -> Result<&str, AuthError> {
    let header = authorization.filter(|h| !h.is_empty()).ok_or_else(|| {
        tracing::debug!(target: "bm.auth.header", "Missing Authorization header");
        AuthError::MissingHeader
    })?;

    let mut parts = header.split_whitespace();

    let scheme = parts.next().unwrap_or_default();
    if !scheme.eq_ignore_ascii_case("bearer") {
        tracing::debug!(target: "bm.auth.header", "Authorization scheme is not Bearer");
        return Err(AuthError::MalformedHeader(BEARER_SCHEME_REQUIRED));
    }

    let token = parts.next().ok_or_else(|| {
        tracing::debug!(target: "bm.auth.header", "Bearer scheme without token");
        AuthError::MalformedHeader(TOKEN_NOT_FOUND)
    })?;

    if parts.next().is_some() {
        tracing::debug!(target: "bm.auth.header", "Authorization header has extra parts");
        return Err(AuthError::MalformedHeader(BEARER_TOKEN_REQUIRED));
    }

    Ok(token)
}
