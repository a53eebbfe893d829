//! Bookmark service error types.
//!
//! Two families live here:
//!
//! - [`AuthError`] - the authorization pipeline's tagged failures. Each carries a
//!   machine-readable code, a client-facing description and an HTTP status.
//! - [`ApiError`] - everything a handler can return, including `AuthError`.
//!
//! Every error reaches the client as
//! `{"success": false, "error": <status>, "message": <description>}`.
//! Storage failures are logged server-side and answered with a generic message.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Description used when the header scheme is not `Bearer`.
pub const BEARER_SCHEME_REQUIRED: &str = "Authorization header must start with \"Bearer\".";

/// Description used when the header carries the scheme but no token.
pub const TOKEN_NOT_FOUND: &str = "Token not found.";

/// Description used when the header carries more than scheme and token.
pub const BEARER_TOKEN_REQUIRED: &str = "Authorization header must be bearer token.";

/// Description used when the token header has no `kid`.
pub const AUTHORIZATION_MALFORMED: &str = "Authorization malformed.";

/// Authorization pipeline failure.
///
/// Status mapping:
/// - MissingHeader, MalformedHeader, TokenExpired, InvalidClaims, UnverifiedToken: 401
/// - KeyNotFound, UnparseableToken, MissingPermissionsClaim: 400
/// - PermissionDenied: 403
/// - KeyFetchFailed: 503
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header is expected.")]
    MissingHeader,

    #[error("{0}")]
    MalformedHeader(&'static str),

    #[error("Unable to find the appropriate key.")]
    KeyNotFound,

    #[error("Unable to fetch the signing key set.")]
    KeyFetchFailed,

    #[error("Token expired.")]
    TokenExpired,

    #[error("Incorrect claims. Please, check the audience and issuer.")]
    InvalidClaims,

    #[error("Unable to parse authentication token.")]
    UnparseableToken,

    /// Outer failure raised by the gate for any verification error.
    ///
    /// `cause` is kept for logs and metrics only; it never reaches the client.
    #[error("Token unverified.")]
    UnverifiedToken { cause: Box<AuthError> },

    #[error("Permissions not included in JWT.")]
    MissingPermissionsClaim,

    #[error("Permission not found.")]
    PermissionDenied,
}

impl AuthError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "authorization_header_missing",
            AuthError::MalformedHeader(_)
            | AuthError::KeyNotFound
            | AuthError::UnparseableToken => "invalid_header",
            AuthError::KeyFetchFailed => "jwks_unavailable",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidClaims | AuthError::MissingPermissionsClaim => "invalid_claims",
            AuthError::UnverifiedToken { .. } => "unverified_token",
            AuthError::PermissionDenied => "unauthorized",
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::MissingHeader
            | AuthError::MalformedHeader(_)
            | AuthError::TokenExpired
            | AuthError::InvalidClaims
            | AuthError::UnverifiedToken { .. } => 401,
            AuthError::KeyNotFound
            | AuthError::UnparseableToken
            | AuthError::MissingPermissionsClaim => 400,
            AuthError::PermissionDenied => 403,
            AuthError::KeyFetchFailed => 503,
        }
    }

    /// The innermost error, looking through the gate's collapse.
    pub fn root_cause(&self) -> &AuthError {
        match self {
            AuthError::UnverifiedToken { cause } => cause.root_cause(),
            other => other,
        }
    }
}

/// Bookmark service error type.
///
/// Maps to HTTP status codes:
/// - NotFound: 404
/// - MethodNotAllowed: 405
/// - Unprocessable: 422
/// - Auth: the status carried by the `AuthError`
/// - Database: 500
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound => 404,
            ApiError::MethodNotAllowed => 405,
            ApiError::Unprocessable(_) => 422,
            ApiError::Auth(err) => err.status_code(),
            ApiError::Database(_) => 500,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::NotFound => "not found".to_string(),
            ApiError::MethodNotAllowed => "method not allowed".to_string(),
            ApiError::Unprocessable(reason) => {
                tracing::debug!(target: "bm.errors", reason = %reason, "Unprocessable request");
                "unprocessable".to_string()
            }
            ApiError::Auth(err) => err.to_string(),
            ApiError::Database(err) => {
                tracing::error!(target: "bm.database", error = %err, "Database operation failed");
                "internal server error".to_string()
            }
        };

        let status_code = self.status_code();
        let status = StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = ErrorResponse {
            success: false,
            error: status_code,
            message,
        };

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"bookmarks\", error=\"invalid_token\""),
            );
        }

        response
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err.to_string())
    }
}
