//! Bookmark service configuration.
//!
//! Configuration is loaded from environment variables. The database URL is
//! redacted in Debug output.

use common::jwt::MAX_CLOCK_SKEW;
use jsonwebtoken::Algorithm;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default accepted signing algorithms.
pub const DEFAULT_AUTH_ALGORITHMS: &str = "RS256";

/// Default JWKS fetch timeout in seconds.
pub const DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Bookmark service configuration.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Identity provider domain, e.g. "tenant.us.auth0.com".
    pub auth_domain: String,

    /// Audience every accepted token must carry.
    pub auth_audience: String,

    /// Signing algorithms accepted for access tokens.
    pub auth_algorithms: Vec<Algorithm>,

    /// URL of the identity provider's key set.
    pub jwks_url: String,

    /// How long fetched keys stay cached. Zero fetches on every verification.
    pub jwks_cache_ttl_seconds: u64,

    /// Timeout for a single JWKS fetch.
    pub jwks_fetch_timeout_seconds: u64,

    /// Leeway applied to `exp`/`nbf` checks.
    pub jwt_leeway_seconds: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("auth_domain", &self.auth_domain)
            .field("auth_audience", &self.auth_audience)
            .field("auth_algorithms", &self.auth_algorithms)
            .field("jwks_url", &self.jwks_url)
            .field("jwks_cache_ttl_seconds", &self.jwks_cache_ttl_seconds)
            .field("jwks_fetch_timeout_seconds", &self.jwks_fetch_timeout_seconds)
            .field("jwt_leeway_seconds", &self.jwt_leeway_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid signing algorithm configuration: {0}")]
    InvalidAlgorithms(String),

    #[error("Invalid JWKS configuration: {0}")]
    InvalidJwks(String),

    #[error("Invalid JWT leeway configuration: {0}")]
    InvalidJwtLeeway(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = required(vars, "DATABASE_URL")?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let auth_domain = required(vars, "AUTH_DOMAIN")?;
        let auth_audience = required(vars, "AUTH_AUDIENCE")?;

        let auth_algorithms = parse_algorithms(
            vars.get("AUTH_ALGORITHMS")
                .map(String::as_str)
                .unwrap_or(DEFAULT_AUTH_ALGORITHMS),
        )?;

        let jwks_url = vars
            .get("AUTH_JWKS_URL")
            .cloned()
            .unwrap_or_else(|| format!("https://{}/.well-known/jwks.json", auth_domain));

        let jwks_cache_ttl_seconds = match vars.get("JWKS_CACHE_TTL_SECONDS") {
            Some(value_str) => value_str.parse::<u64>().map_err(|e| {
                ConfigError::InvalidJwks(format!(
                    "JWKS_CACHE_TTL_SECONDS must be a non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?,
            None => 0,
        };

        let jwks_fetch_timeout_seconds = match vars.get("JWKS_FETCH_TIMEOUT_SECONDS") {
            Some(value_str) => {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidJwks(format!(
                        "JWKS_FETCH_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidJwks(
                        "JWKS_FETCH_TIMEOUT_SECONDS must be greater than 0".to_string(),
                    ));
                }

                value
            }
            None => DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS,
        };

        let jwt_leeway_seconds = match vars.get("JWT_LEEWAY_SECONDS") {
            Some(value_str) => {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidJwtLeeway(format!(
                        "JWT_LEEWAY_SECONDS must be a non-negative integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value > MAX_CLOCK_SKEW.as_secs() {
                    return Err(ConfigError::InvalidJwtLeeway(format!(
                        "JWT_LEEWAY_SECONDS must not exceed {} seconds, got {}",
                        MAX_CLOCK_SKEW.as_secs(),
                        value
                    )));
                }

                value
            }
            None => 0,
        };

        Ok(Config {
            database_url,
            bind_address,
            auth_domain,
            auth_audience,
            auth_algorithms,
            jwks_url,
            jwks_cache_ttl_seconds,
            jwks_fetch_timeout_seconds,
            jwt_leeway_seconds,
        })
    }

    /// Issuer every accepted token must carry.
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.auth_domain)
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

/// Parse a comma-separated algorithm list such as "RS256,EdDSA".
fn parse_algorithms(raw: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let mut algorithms = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let algorithm = Algorithm::from_str(name).map_err(|_| {
            ConfigError::InvalidAlgorithms(format!("unknown algorithm '{}'", name))
        })?;
        if matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(ConfigError::InvalidAlgorithms(format!(
                "symmetric algorithm '{}' cannot be verified against a public key set",
                name
            )));
        }
        if !algorithms.contains(&algorithm) {
            algorithms.push(algorithm);
        }
    }

    if algorithms.is_empty() {
        return Err(ConfigError::InvalidAlgorithms(
            "AUTH_ALGORITHMS must name at least one algorithm".to_string(),
        ));
    }

    Ok(algorithms)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://localhost/bookmark".to_string(),
            ),
            (
                "AUTH_DOMAIN".to_string(),
                "bookmarks-dev.us.auth0.com".to_string(),
            ),
            ("AUTH_AUDIENCE".to_string(), "bookmark".to_string()),
        ])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(config.database_url, "postgresql://localhost/bookmark");
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.auth_audience, "bookmark");
        assert_eq!(config.auth_algorithms, vec![Algorithm::RS256]);
        assert_eq!(
            config.jwks_url,
            "https://bookmarks-dev.us.auth0.com/.well-known/jwks.json"
        );
        assert_eq!(config.jwks_cache_ttl_seconds, 0);
        assert_eq!(
            config.jwks_fetch_timeout_seconds,
            DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS
        );
        assert_eq!(config.jwt_leeway_seconds, 0);
        assert_eq!(config.issuer(), "https://bookmarks-dev.us.auth0.com/");
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let mut vars = base_vars();
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string());
        vars.insert("AUTH_ALGORITHMS".to_string(), "RS256, EdDSA".to_string());
        vars.insert(
            "AUTH_JWKS_URL".to_string(),
            "http://127.0.0.1:4000/.well-known/jwks.json".to_string(),
        );
        vars.insert("JWKS_CACHE_TTL_SECONDS".to_string(), "300".to_string());
        vars.insert("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "3".to_string());
        vars.insert("JWT_LEEWAY_SECONDS".to_string(), "30".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(
            config.auth_algorithms,
            vec![Algorithm::RS256, Algorithm::EdDSA]
        );
        assert_eq!(config.jwks_url, "http://127.0.0.1:4000/.well-known/jwks.json");
        assert_eq!(config.jwks_cache_ttl_seconds, 300);
        assert_eq!(config.jwks_fetch_timeout_seconds, 3);
        assert_eq!(config.jwt_leeway_seconds, 30);
    }

    #[test]
    fn test_from_vars_missing_required_values() {
        for name in ["DATABASE_URL", "AUTH_DOMAIN", "AUTH_AUDIENCE"] {
            let mut vars = base_vars();
            vars.remove(name);

            let result = Config::from_vars(&vars);
            assert!(
                matches!(&result, Err(ConfigError::MissingEnvVar(v)) if v == name),
                "expected missing {name}, got {result:?}"
            );
        }
    }

    #[test]
    fn test_blank_audience_is_missing() {
        let mut vars = base_vars();
        vars.insert("AUTH_AUDIENCE".to_string(), "  ".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "AUTH_AUDIENCE"));
    }

    #[test]
    fn test_algorithms_reject_unknown_name() {
        let mut vars = base_vars();
        vars.insert("AUTH_ALGORITHMS".to_string(), "RS256,XX999".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidAlgorithms(msg)) if msg.contains("XX999"))
        );
    }

    #[test]
    fn test_algorithms_reject_symmetric() {
        let mut vars = base_vars();
        vars.insert("AUTH_ALGORITHMS".to_string(), "HS256".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidAlgorithms(msg)) if msg.contains("symmetric"))
        );
    }

    #[test]
    fn test_algorithms_reject_empty_list() {
        let mut vars = base_vars();
        vars.insert("AUTH_ALGORITHMS".to_string(), " , ".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidAlgorithms(_))));
    }

    #[test]
    fn test_algorithms_deduplicated() {
        let mut vars = base_vars();
        vars.insert("AUTH_ALGORITHMS".to_string(), "RS256,RS256".to_string());

        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(config.auth_algorithms, vec![Algorithm::RS256]);
    }

    #[test]
    fn test_fetch_timeout_rejects_zero() {
        let mut vars = base_vars();
        vars.insert("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwks(msg)) if msg.contains("must be greater than 0"))
        );
    }

    #[test]
    fn test_cache_ttl_rejects_non_numeric() {
        let mut vars = base_vars();
        vars.insert("JWKS_CACHE_TTL_SECONDS".to_string(), "five".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwks(msg)) if msg.contains("non-negative integer"))
        );
    }

    #[test]
    fn test_leeway_rejects_too_large() {
        let mut vars = base_vars();
        vars.insert("JWT_LEEWAY_SECONDS".to_string(), "601".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtLeeway(msg)) if msg.contains("must not exceed 600"))
        );
    }

    #[test]
    fn test_leeway_rejects_negative() {
        let mut vars = base_vars();
        vars.insert("JWT_LEEWAY_SECONDS".to_string(), "-1".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidJwtLeeway(_))));
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = Config::from_vars(&base_vars()).unwrap();
        let debug_output = format!("{:?}", config);

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("postgresql://"));
    }
}
