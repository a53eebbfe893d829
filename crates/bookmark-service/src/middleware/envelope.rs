//! JSON error envelope for rejections generated by the router itself.
//!
//! Handlers already answer with `ApiError`. The method router answers a
//! known path with the wrong method using an empty 405; this rewrites it
//! into the same `{success, error, message}` shape, keeping `Allow`.

use crate::errors::ApiError;
use axum::{
    extract::Request,
    http::{header::ALLOW, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

pub async fn error_envelope_middleware(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(ALLOW).cloned();
    let mut enveloped = ApiError::MethodNotAllowed.into_response();
    if let Some(allow) = allow {
        enveloped.headers_mut().insert(ALLOW, allow);
    }
    enveloped
}
