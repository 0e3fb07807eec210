//! Refresh-token session lifecycle.

pub mod manager;
pub mod rotation;
pub mod store;

pub use manager::{AuthOutcome, RefreshOutcome, SessionManager};
pub use rotation::{AlwaysRotate, NeverRotate, RotationPolicy, SampledRotate};
pub use store::SessionStore;

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a raw token.
///
/// The raw refresh token is never persisted; sessions are looked up by
/// this digest.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable_hex() {
        let a = token_digest("token-a");
        let b = token_digest("token-a");
        let c = token_digest("token-b");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}
