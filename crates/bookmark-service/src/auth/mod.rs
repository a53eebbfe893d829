//! Authorization pipeline.
//!
//! Access tokens are issued by an external identity provider and verified
//! against the provider's published key set.
//!
//! # Components
//!
//! - `header` - Bearer token extraction from the Authorization header
//! - `jwks` - Key-set client for the provider's `/.well-known/jwks.json`
//! - `jwt` - Token verification with per-failure error classification
//! - `permissions` - Permission check against the `permissions` claim
//! - `gate` - Composition of the above around a protected operation
//! - `claims` - Decoded token payload

pub mod claims;
pub mod gate;
pub mod header;
pub mod jwks;
pub mod jwt;
pub mod permissions;

pub use claims::{Audience, Claims};
pub use gate::requires_auth;
pub use header::extract_bearer_token;
pub use jwks::{Jwk, JwksClient};
pub use jwt::TokenVerifier;
pub use permissions::check_permissions;
