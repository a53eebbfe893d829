//! Test server harness for E2E testing
//!
//! Provides `TestBookmarkServer`, which runs the real router against an
//! in-memory store and a wiremock JWKS endpoint serving the fixture keys.

use crate::crypto_fixtures::{Ed25519TestKey, RsaTestKey};
use crate::token_builders::TestClaimsBuilder;
use axum::Router;
use bookmark_service::config::Config;
use bookmark_service::observability::metrics::init_metrics_recorder;
use bookmark_service::repositories::mock::InMemoryStore;
use bookmark_service::routes::{self, AppState};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Identity provider domain used by test configuration.
pub const TEST_AUTH_DOMAIN: &str = "bookmarks-test.example.com";

/// Audience used by test configuration.
pub const TEST_AUDIENCE: &str = "bookmark";

pub const TEST_RSA_KID: &str = "test-rsa-key-01";
pub const TEST_ED25519_KID: &str = "test-ed25519-key-01";

/// Path the mocked identity provider serves its key set on.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Process-wide Prometheus handle.
///
/// The global recorder can be installed once per process; later callers
/// share the first handle.
pub fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder().unwrap_or_else(|_| {
                metrics_exporter_prometheus::PrometheusBuilder::new()
                    .build_recorder()
                    .handle()
            })
        })
        .clone()
}

/// Configuration pointing at `jwks_url`, plus any `overrides`.
pub fn test_config(jwks_url: &str, overrides: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
    let mut vars = HashMap::from([
        (
            "DATABASE_URL".to_string(),
            "postgresql://test/test".to_string(),
        ),
        ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        ("AUTH_DOMAIN".to_string(), TEST_AUTH_DOMAIN.to_string()),
        ("AUTH_AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
        ("AUTH_ALGORITHMS".to_string(), "RS256,EdDSA".to_string()),
        ("AUTH_JWKS_URL".to_string(), jwks_url.to_string()),
    ]);
    for (name, value) in overrides {
        vars.insert((*name).to_string(), (*value).to_string());
    }

    Config::from_vars(&vars).map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))
}

/// Mocked identity provider serving the fixture key set.
pub struct TestJwksServer {
    server: MockServer,
    rsa_key: RsaTestKey,
    ed25519_key: Ed25519TestKey,
}

impl TestJwksServer {
    /// Start a JWKS endpoint that serves both fixture keys.
    pub async fn start() -> Result<Self, anyhow::Error> {
        let server = MockServer::start().await;
        let rsa_key = RsaTestKey::new(TEST_RSA_KID);
        let ed25519_key = Ed25519TestKey::from_seed(TEST_ED25519_KID, 1);

        let jwks = serde_json::json!({
            "keys": [rsa_key.jwk_json(), ed25519_key.jwk_json()?]
        });

        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks))
            .mount(&server)
            .await;

        Ok(Self {
            server,
            rsa_key,
            ed25519_key,
        })
    }

    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    /// The underlying mock server, for request counting or extra mocks.
    pub fn mock_server(&self) -> &MockServer {
        &self.server
    }

    pub fn rsa_key(&self) -> &RsaTestKey {
        &self.rsa_key
    }

    pub fn ed25519_key(&self) -> &Ed25519TestKey {
        &self.ed25519_key
    }

    /// Number of key-set fetches received so far.
    pub async fn fetch_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    /// Claims builder preset for the test domain and audience.
    pub fn claims(&self) -> TestClaimsBuilder {
        TestClaimsBuilder::new(TEST_AUTH_DOMAIN, TEST_AUDIENCE)
    }

    /// RS256 token granting `permissions`.
    pub fn token_with_permissions(&self, permissions: &[&str]) -> Result<String, anyhow::Error> {
        let claims = self.claims().with_permissions(permissions).build();
        Ok(self.rsa_key.sign(&claims)?)
    }
}

/// Build the real router for in-process (`oneshot`) tests.
pub fn build_test_router(store: InMemoryStore, config: Config) -> Router {
    let state = Arc::new(AppState {
        store: Arc::new(store),
        config,
    });
    routes::build_routes(state, test_metrics_handle())
}

/// Test harness for spawning the bookmark service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() -> anyhow::Result<()> {
///     let server = TestBookmarkServer::spawn(InMemoryStore::new()).await?;
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestBookmarkServer {
    addr: SocketAddr,
    jwks: TestJwksServer,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestBookmarkServer {
    /// Spawn a server over `store` with the default test configuration.
    pub async fn spawn(store: InMemoryStore) -> Result<Self, anyhow::Error> {
        Self::spawn_with(store, &[]).await
    }

    /// Spawn a server with configuration `overrides` (e.g. cache TTL).
    ///
    /// The server binds to 127.0.0.1:0 and runs in the background.
    pub async fn spawn_with(
        store: InMemoryStore,
        overrides: &[(&str, &str)],
    ) -> Result<Self, anyhow::Error> {
        let jwks = TestJwksServer::start().await?;
        let config = test_config(&jwks.jwks_url(), overrides)?;

        let app = build_test_router(store, config.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            jwks,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn jwks(&self) -> &TestJwksServer {
        &self.jwks
    }

    /// RS256 token granting `permissions`.
    pub fn token_with_permissions(&self, permissions: &[&str]) -> Result<String, anyhow::Error> {
        self.jwks.token_with_permissions(permissions)
    }
}

impl Drop for TestBookmarkServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
