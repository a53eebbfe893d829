//! Permission check against the `permissions` claim.

use crate::auth::Claims;
use crate::errors::AuthError;

/// Confirm that `claims` grant `permission`.
///
/// An empty `permission` means the route needs a verified token but no
/// particular permission.
///
/// # Errors
///
/// - `MissingPermissionsClaim` - the token carries no `permissions` claim at all
/// - `PermissionDenied` - the permission is not in the set
pub fn check_permissions(permission: &str, claims: &Claims) -> Result<(), AuthError> {
    let Some(granted) = claims.permissions.as_ref() else {
        tracing::debug!(target: "bm.auth.permissions", "Token has no permissions claim");
        return Err(AuthError::MissingPermissionsClaim);
    };

    if permission.is_empty() || granted.contains(permission) {
        return Ok(());
    }

    tracing::debug!(
        target: "bm.auth.permissions",
        required = %permission,
        "Permission not granted"
    );
    Err(AuthError::PermissionDenied)
}
