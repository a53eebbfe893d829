//! Permission gate for protected route groups.
//!
//! Wraps [`requires_auth`] as axum middleware. On success the verified
//! [`Claims`](crate::auth::Claims) are placed in request extensions for handlers.

use crate::auth::{requires_auth, TokenVerifier};
use crate::errors::{ApiError, AuthError, BEARER_SCHEME_REQUIRED};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

/// State for one gated route group.
#[derive(Clone)]
pub struct GateState {
    pub verifier: Arc<TokenVerifier>,

    /// Permission the group requires; empty means any verified token.
    pub permission: &'static str,
}

/// Gate middleware.
///
/// # Response
///
/// - 401/400/403/503 per [`AuthError`] if the request is not authorized
/// - Continues to the handler with `Claims` in extensions otherwise
#[instrument(skip_all, name = "bm.middleware.auth")]
pub async fn require_permission(
    State(state): State<GateState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // A value that is not visible ASCII cannot carry a bearer token.
    let authorization = match req.headers().get(AUTHORIZATION) {
        None => None,
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| {
                    tracing::debug!(target: "bm.middleware.auth", "Non-ASCII Authorization header");
                    AuthError::MalformedHeader(BEARER_SCHEME_REQUIRED)
                })?
                .to_owned(),
        ),
    };

    let response = requires_auth(
        &state.verifier,
        authorization.as_deref(),
        state.permission,
        |claims| async move {
            let mut req = req;
            req.extensions_mut().insert(claims);
            next.run(req).await
        },
    )
    .await?;

    Ok(response)
}
