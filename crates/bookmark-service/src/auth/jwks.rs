//! JWKS client for the identity provider's published signing keys.
//!
//! Keys are fetched from `/.well-known/jwks.json`. Caching is optional:
//! without a TTL every lookup fetches the key set fresh, so rotated or
//! revoked keys take effect immediately. With a TTL, keys are cached and a
//! lookup for an unknown `kid` refreshes the set at most once per cooldown.

use crate::errors::AuthError;
use crate::observability::metrics;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::instrument;

/// Minimum time between refreshes triggered by an unknown `kid`.
const MISS_REFRESH_COOLDOWN: Duration = Duration::from_secs(10);

/// JSON Web Key from the JWKS endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type: "RSA", "OKP" or "EC".
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    #[serde(default)]
    pub kid: String,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    #[serde(default)]
    pub alg: Option<String>,

    /// RSA modulus (base64url).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default)]
    pub e: Option<String>,

    /// Curve name for OKP and EC keys.
    #[serde(default)]
    pub crv: Option<String>,

    /// OKP public key, or EC x coordinate (base64url).
    #[serde(default)]
    pub x: Option<String>,

    /// EC y coordinate (base64url).
    #[serde(default)]
    pub y: Option<String>,
}

/// JWKS document.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    pub keys: Vec<Jwk>,
}

struct CachedJwks {
    keys: HashMap<String, Jwk>,
    fetched_at: Instant,
}

/// JWKS client for fetching and optionally caching public keys.
pub struct JwksClient {
    jwks_url: String,
    http_client: reqwest::Client,
    cache: Arc<RwLock<Option<CachedJwks>>>,
    /// `None` disables caching.
    cache_ttl: Option<Duration>,
}

impl JwksClient {
    /// Create a new JWKS client.
    ///
    /// # Arguments
    ///
    /// * `jwks_url` - URL of the provider's JWKS endpoint
    /// * `fetch_timeout` - Upper bound on a single key-set fetch
    /// * `cache_ttl` - How long fetched keys stay fresh; `None` fetches on every lookup
    pub fn new(jwks_url: String, fetch_timeout: Duration, cache_ttl: Option<Duration>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "bm.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            cache: Arc::new(RwLock::new(None)),
            cache_ttl: cache_ttl.filter(|ttl| !ttl.is_zero()),
        }
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    pub fn caching_enabled(&self) -> bool {
        self.cache_ttl.is_some()
    }

    /// Fetch the key set and index it by `kid`.
    ///
    /// Keys without a `kid` can never be selected and are dropped.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeyFetchFailed` on transport failure, a non-2xx
    /// status, or a body that is not a JWKS document.
    #[instrument(skip_all, name = "bm.auth.jwks.fetch")]
    pub async fn fetch_key_set(&self) -> Result<HashMap<String, Jwk>, AuthError> {
        let start = Instant::now();
        let result = self.fetch_key_set_inner().await;

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::record_jwks_fetch(status, start.elapsed());

        result
    }

    async fn fetch_key_set_inner(&self) -> Result<HashMap<String, Jwk>, AuthError> {
        tracing::debug!(target: "bm.auth.jwks", url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "bm.auth.jwks", error = %e, "Failed to fetch JWKS");
                AuthError::KeyFetchFailed
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "bm.auth.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(AuthError::KeyFetchFailed);
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            tracing::error!(target: "bm.auth.jwks", error = %e, "Failed to parse JWKS response");
            AuthError::KeyFetchFailed
        })?;

        let keys: HashMap<String, Jwk> = jwks
            .keys
            .into_iter()
            .filter(|key| !key.kid.is_empty())
            .map(|key| (key.kid.clone(), key))
            .collect();

        tracing::debug!(target: "bm.auth.jwks", key_count = keys.len(), "JWKS fetched");

        Ok(keys)
    }

    /// Get a JWK by key ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeyFetchFailed` if the key set cannot be fetched.
    /// Returns `AuthError::KeyNotFound` if no key carries `kid`.
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn get_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        let Some(ttl) = self.cache_ttl else {
            let keys = self.fetch_key_set().await?;
            return lookup(&keys, kid);
        };

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                let age = cached.fetched_at.elapsed();
                if age < ttl {
                    if let Some(key) = cached.keys.get(kid) {
                        tracing::debug!(target: "bm.auth.jwks", kid = %kid, "JWKS cache hit");
                        return Ok(key.clone());
                    }
                    if age < MISS_REFRESH_COOLDOWN {
                        tracing::debug!(target: "bm.auth.jwks", kid = %kid, "Key not in recently refreshed JWKS cache");
                        return Err(AuthError::KeyNotFound);
                    }
                }
            }
        }

        let keys = self.fetch_key_set().await?;
        let result = lookup(&keys, kid);

        let mut cache = self.cache.write().await;
        *cache = Some(CachedJwks {
            keys,
            fetched_at: Instant::now(),
        });
        tracing::debug!(target: "bm.auth.jwks", "JWKS cache refreshed");

        result
    }

    /// Drop cached keys so the next lookup fetches.
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }
}

fn lookup(keys: &HashMap<String, Jwk>, kid: &str) -> Result<Jwk, AuthError> {
    keys.get(kid).cloned().ok_or_else(|| {
        tracing::debug!(target: "bm.auth.jwks", kid = %kid, "Key not found in JWKS");
        AuthError::KeyNotFound
    })
}
