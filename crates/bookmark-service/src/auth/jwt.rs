//! Access token verification.
//!
//! Verifies tokens issued by the identity provider against keys from its
//! JWKS endpoint.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - The `kid` is read from the unverified header only to select a key
//! - Only configured asymmetric algorithms that fit the key type are accepted
//! - `exp`, `aud` and `iss` are required and validated

use crate::auth::claims::Claims;
use crate::auth::jwks::{Jwk, JwksClient};
use crate::errors::{AuthError, AUTHORIZATION_MALFORMED};
use crate::observability::metrics;
use common::jwt::{inspect_header, JwtValidationError};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use tracing::instrument;

/// Verifies bearer tokens and returns their claims.
pub struct TokenVerifier {
    jwks_client: Arc<JwksClient>,
    /// Expected `iss`, `https://{domain}/`.
    issuer: String,
    audience: String,
    algorithms: Vec<Algorithm>,
    leeway_seconds: u64,
}

impl TokenVerifier {
    /// Create a new token verifier.
    ///
    /// # Arguments
    ///
    /// * `jwks_client` - Client for fetching public keys
    /// * `issuer` - Expected `iss` claim
    /// * `audience` - Expected `aud` claim value
    /// * `algorithms` - Accepted signing algorithms
    /// * `leeway_seconds` - Clock skew tolerance for `exp` and `nbf`
    pub fn new(
        jwks_client: Arc<JwksClient>,
        issuer: String,
        audience: String,
        algorithms: Vec<Algorithm>,
        leeway_seconds: u64,
    ) -> Self {
        Self {
            jwks_client,
            issuer,
            audience,
            algorithms,
            leeway_seconds,
        }
    }

    /// Verify a token and return its claims.
    ///
    /// # Steps
    ///
    /// 1. Size check and unverified header parse for `kid`
    /// 2. Key lookup in the JWKS (no signature check without a key)
    /// 3. Signature verification and claims decoding
    /// 4. `exp`, `aud` and `iss` validation
    ///
    /// # Errors
    ///
    /// - `MalformedHeader` - no `kid` in the token header
    /// - `KeyFetchFailed` / `KeyNotFound` - key resolution failed
    /// - `TokenExpired` - `exp` is in the past
    /// - `InvalidClaims` - audience or issuer mismatch, or a required claim is missing
    /// - `UnparseableToken` - everything else
    #[instrument(skip_all, name = "bm.auth.verify")]
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let result = self.verify_inner(token).await;

        match &result {
            Ok(_) => {
                tracing::debug!(target: "bm.auth.jwt", "Token verified");
                metrics::record_token_validation("success", None);
            }
            Err(e) => {
                tracing::debug!(target: "bm.auth.jwt", error_code = e.code(), error = %e, "Token rejected");
                metrics::record_token_validation("error", Some(e.code()));
            }
        }

        result
    }

    async fn verify_inner(&self, token: &str) -> Result<Claims, AuthError> {
        let header = inspect_header(token).map_err(|e| match e {
            JwtValidationError::MissingKid => AuthError::MalformedHeader(AUTHORIZATION_MALFORMED),
            JwtValidationError::TokenTooLarge | JwtValidationError::MalformedToken => {
                AuthError::UnparseableToken
            }
        })?;

        let jwk = self.jwks_client.get_key(&header.kid).await?;

        let decoding_key = decoding_key(&jwk)?;

        let algorithms = compatible_algorithms(&jwk.kty, &self.algorithms);
        let Some(first) = algorithms.first().copied() else {
            tracing::debug!(
                target: "bm.auth.jwt",
                kty = %jwk.kty,
                header_alg = header.alg.as_deref().unwrap_or("none"),
                "No accepted algorithm fits the key type"
            );
            return Err(AuthError::UnparseableToken);
        };

        let mut validation = Validation::new(first);
        validation.algorithms = algorithms;
        validation.leeway = self.leeway_seconds;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            tracing::debug!(
                target: "bm.auth.jwt",
                kid = %header.kid,
                header_alg = header.alg.as_deref().unwrap_or("none"),
                error = %e,
                "Token failed verification"
            );
            classify(&e)
        })?;

        Ok(token_data.claims)
    }
}

/// Build a decoding key from the JWK's public components.
fn decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    let key = match jwk.kty.as_str() {
        "RSA" => {
            let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
                tracing::warn!(target: "bm.auth.jwt", kid = %jwk.kid, "RSA JWK missing n or e");
                return Err(AuthError::UnparseableToken);
            };
            DecodingKey::from_rsa_components(n, e)
        }
        "OKP" => {
            let Some(x) = jwk.x.as_deref() else {
                tracing::warn!(target: "bm.auth.jwt", kid = %jwk.kid, "OKP JWK missing x");
                return Err(AuthError::UnparseableToken);
            };
            DecodingKey::from_ed_components(x)
        }
        "EC" => {
            let (Some(x), Some(y)) = (jwk.x.as_deref(), jwk.y.as_deref()) else {
                tracing::warn!(target: "bm.auth.jwt", kid = %jwk.kid, "EC JWK missing x or y");
                return Err(AuthError::UnparseableToken);
            };
            DecodingKey::from_ec_components(x, y)
        }
        other => {
            tracing::warn!(target: "bm.auth.jwt", kty = %other, "Unsupported JWK key type");
            return Err(AuthError::UnparseableToken);
        }
    };

    key.map_err(|e| {
        tracing::warn!(target: "bm.auth.jwt", kid = %jwk.kid, error = %e, "Invalid JWK key material");
        AuthError::UnparseableToken
    })
}

/// Accepted algorithms that can be verified with a key of type `kty`.
fn compatible_algorithms(kty: &str, accepted: &[Algorithm]) -> Vec<Algorithm> {
    accepted
        .iter()
        .copied()
        .filter(|alg| match alg {
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => kty == "RSA",
            Algorithm::EdDSA => kty == "OKP",
            Algorithm::ES256 | Algorithm::ES384 => kty == "EC",
            _ => false,
        })
        .collect()
}

fn classify(error: &jsonwebtoken::errors::Error) -> AuthError {
    match error.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidAudience
        | ErrorKind::InvalidIssuer
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::ImmatureSignature => AuthError::InvalidClaims,
        _ => AuthError::UnparseableToken,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    const RSA_N: &str = "y1x6oCuSc4KIHUXWr7SLgE6XaSFX-aJEBbb-Itd1YFsxOYCC0M23T9cd-G9S4dRMXNykMEMWhJBzvsFdAoyecXPARd6l4O0mDsjtHvtYs1Zj6fSTnlwQLIZqSSbTHwpvOeJ8Ch6WHlSAf6ZCzSkRe-ls0UZu6TR16s9pa5YFKgvqEKEt721XzyteQo_QEKUOVXA9Tza2jMe2Un_OvAjSfnLTR-kturOqg_saBjycrA17xpLZMDUgl2BqpmSYT73ngByVApxohtoCyXiN2x5Ib9ZOG5LdHXONmCtLjwkOi6s55r6ADpc8QI3opFcvYH4pbhm2koKuMzThXKMQYwTCwQ";

    fn jwk(kty: &str) -> Jwk {
        Jwk {
            kty: kty.to_string(),
            kid: "test-key".to_string(),
            key_use: Some("sig".to_string()),
            alg: None,
            n: None,
            e: None,
            crv: None,
            x: None,
            y: None,
        }
    }

    fn unreachable_verifier() -> TokenVerifier {
        let jwks = JwksClient::new(
            "http://127.0.0.1:9/.well-known/jwks.json".to_string(),
            Duration::from_secs(1),
            None,
        );
        TokenVerifier::new(
            Arc::new(jwks),
            "https://bookmarks.example.com/".to_string(),
            "bookmark".to_string(),
            vec![Algorithm::RS256],
            0,
        )
    }

    #[test]
    fn test_rsa_decoding_key() {
        let mut key = jwk("RSA");
        key.n = Some(RSA_N.to_string());
        key.e = Some("AQAB".to_string());
        assert!(decoding_key(&key).is_ok());
    }

    #[test]
    fn test_rsa_key_missing_exponent() {
        let mut key = jwk("RSA");
        key.n = Some(RSA_N.to_string());
        assert_eq!(decoding_key(&key).err(), Some(AuthError::UnparseableToken));
    }

    #[test]
    fn test_okp_key_missing_x() {
        assert_eq!(
            decoding_key(&jwk("OKP")).err(),
            Some(AuthError::UnparseableToken)
        );
    }

    #[test]
    fn test_unsupported_key_type() {
        assert_eq!(
            decoding_key(&jwk("oct")).err(),
            Some(AuthError::UnparseableToken)
        );
    }

    #[test]
    fn test_compatible_algorithms_filters_by_key_type() {
        let accepted = [Algorithm::RS256, Algorithm::EdDSA, Algorithm::ES256];

        assert_eq!(compatible_algorithms("RSA", &accepted), vec![Algorithm::RS256]);
        assert_eq!(compatible_algorithms("OKP", &accepted), vec![Algorithm::EdDSA]);
        assert_eq!(compatible_algorithms("EC", &accepted), vec![Algorithm::ES256]);
        assert!(compatible_algorithms("oct", &accepted).is_empty());
    }

    #[test]
    fn test_compatible_algorithms_never_admits_hmac() {
        let accepted = [Algorithm::HS256, Algorithm::RS256];
        assert_eq!(compatible_algorithms("RSA", &accepted), vec![Algorithm::RS256]);
    }

    #[test]
    fn test_classify_expired() {
        let err = jsonwebtoken::errors::Error::from(ErrorKind::ExpiredSignature);
        assert_eq!(classify(&err), AuthError::TokenExpired);
    }

    #[test]
    fn test_classify_claim_failures() {
        for kind in [
            ErrorKind::InvalidAudience,
            ErrorKind::InvalidIssuer,
            ErrorKind::ImmatureSignature,
            ErrorKind::MissingRequiredClaim("aud".to_string()),
        ] {
            let err = jsonwebtoken::errors::Error::from(kind);
            assert_eq!(classify(&err), AuthError::InvalidClaims);
        }
    }

    #[test]
    fn test_classify_everything_else_as_unparseable() {
        for kind in [
            ErrorKind::InvalidSignature,
            ErrorKind::InvalidToken,
            ErrorKind::InvalidAlgorithm,
            ErrorKind::InvalidRsaKey("bad".to_string()),
        ] {
            let err = jsonwebtoken::errors::Error::from(kind);
            assert_eq!(classify(&err), AuthError::UnparseableToken);
        }
    }

    #[tokio::test]
    async fn test_missing_kid_fails_before_key_fetch() {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let token = format!("{header}.e30.c2ln");

        // The JWKS URL is unreachable, so reaching the fetch would yield KeyFetchFailed.
        let err = unreachable_verifier().verify(&token).await.unwrap_err();
        assert_eq!(err, AuthError::MalformedHeader(AUTHORIZATION_MALFORMED));
    }

    #[tokio::test]
    async fn test_garbage_token_is_unparseable() {
        let err = unreachable_verifier().verify("not-a-jwt").await.unwrap_err();
        assert_eq!(err, AuthError::UnparseableToken);
    }

    #[tokio::test]
    async fn test_oversized_token_is_unparseable() {
        let token = "a".repeat(common::jwt::MAX_JWT_SIZE_BYTES + 1);
        let err = unreachable_verifier().verify(&token).await.unwrap_err();
        assert_eq!(err, AuthError::UnparseableToken);
    }
}
