//! Authorization gate around a protected operation.

use crate::auth::{check_permissions, extract_bearer_token, Claims, TokenVerifier};
use crate::errors::AuthError;
use std::future::Future;

/// Run `operation` only if `authorization` carries a valid token granting
/// `permission`.
///
/// Header and permission errors are returned as-is. Every verification
/// failure is collapsed into `UnverifiedToken`, keeping the original error
/// as its `cause` for logs. `operation` runs at most once, and only on success.
///
/// # Errors
///
/// See [`extract_bearer_token`], [`TokenVerifier::verify`] and
/// [`check_permissions`].
pub async fn requires_auth<F, Fut, T>(
    verifier: &TokenVerifier,
    authorization: Option<&str>,
    permission: &str,
    operation: F,
) -> Result<T, AuthError>
where
    F: FnOnce(Claims) -> Fut,
    Fut: Future<Output = T>,
{
    let token = extract_bearer_token(authorization)?;

    let claims = verifier.verify(token).await.map_err(|cause| {
        tracing::info!(
            target: "bm.auth.gate",
            cause = %cause,
            cause_code = cause.code(),
            "Token unverified"
        );
        AuthError::UnverifiedToken {
            cause: Box::new(cause),
        }
    })?;

    check_permissions(permission, &claims)?;

    Ok(operation(claims).await)
}
