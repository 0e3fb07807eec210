//! JWT token issuance, verification, and revocation hooks.

pub mod blacklist;
pub mod claims;
pub mod issuer;
pub mod verifier;

pub use blacklist::{CacheBlacklist, NoopBlacklist, TokenBlacklist};
pub use claims::{AccessClaims, RefreshClaims, TokenType};
pub use issuer::{TokenIssuer, TokenPair};
pub use verifier::TokenVerifier;

/// Fixed issuer claim embedded in every Atlas token.
pub const TOKEN_ISSUER: &str = "atlas-auth";

/// Fixed audience claim embedded in every Atlas token.
pub const TOKEN_AUDIENCE: &str = "atlas-app";
