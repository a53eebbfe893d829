//! HTTP routes for the bookmark service.
//!
//! Defines the Axum router and application state.

use crate::auth::{JwksClient, TokenVerifier};
use crate::config::Config;
use crate::handlers;
use crate::middleware::{
    error_envelope_middleware, http_metrics_middleware, require_permission, GateState,
};
use crate::repositories::BookmarkStore;
use axum::{
    http::{header, Method},
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookmarkStore>,

    pub config: Config,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness check (simple "OK") - public
/// - `/ready` - Readiness check (store ping) - public
/// - `/metrics` - Prometheus metrics endpoint - public
/// - `GET /`, `GET /bookmarks` - List bookmarks - public
/// - `GET /categories` - requires `get:categories`
/// - `POST /bookmarks` - requires `post:bookmarks`
/// - `PATCH /bookmarks/:id` - requires `patch:bookmarks`
/// - `DELETE /bookmarks/:id` - requires `delete:bookmarks`
/// - JSON 404 fallback and 405 envelope
/// - TraceLayer, CORS, 30 second request timeout, HTTP metrics
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let config = &state.config;
    let cache_ttl = (config.jwks_cache_ttl_seconds > 0)
        .then(|| Duration::from_secs(config.jwks_cache_ttl_seconds));
    let jwks_client = Arc::new(JwksClient::new(
        config.jwks_url.clone(),
        Duration::from_secs(config.jwks_fetch_timeout_seconds),
        cache_ttl,
    ));
    let verifier = Arc::new(TokenVerifier::new(
        jwks_client,
        config.issuer(),
        config.auth_audience.clone(),
        config.auth_algorithms.clone(),
        config.jwt_leeway_seconds,
    ));

    let gate = |permission: &'static str| {
        middleware::from_fn_with_state(
            GateState {
                verifier: Arc::clone(&verifier),
                permission,
            },
            require_permission,
        )
    };

    // Gates wrap single methods so a wrong method on a known path
    // reaches the method router's 405 without authorization.
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/", get(handlers::list_bookmarks))
        .route(
            "/bookmarks",
            get(handlers::list_bookmarks)
                .merge(post(handlers::create_bookmark).route_layer(gate("post:bookmarks"))),
        )
        .route(
            "/bookmarks/:id",
            patch(handlers::update_bookmark)
                .route_layer(gate("patch:bookmarks"))
                .merge(delete(handlers::delete_bookmark).route_layer(gate("delete:bookmarks"))),
        )
        .route(
            "/categories",
            get(handlers::list_categories).route_layer(gate("get:categories")),
        )
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Layer order (bottom-to-top execution):
    // 1. TraceLayer
    // 2. TimeoutLayer
    // 3. error_envelope_middleware - JSON body for router-generated 405s
    // 4. CorsLayer - answers preflight, decorates every response
    // 5. http_metrics_middleware - Record ALL responses (outermost)
    api_routes
        .merge(metrics_routes)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(error_envelope_middleware))
        .layer(cors)
        .layer(middleware::from_fn(http_metrics_middleware))
}
