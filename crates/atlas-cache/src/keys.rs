//! Cache key builders for all Atlas cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses.

use uuid::Uuid;

/// Prefix applied to all Atlas cache keys.
const PREFIX: &str = "atlas";

// ── Lockout keys ───────────────────────────────────────────

/// Failure counter for one (network origin, login email) pair.
pub fn lockout_counter(ip: &str, email: &str) -> String {
    format!("{PREFIX}:lockout:count:{ip}:{}", email.to_lowercase())
}

/// Lock marker holding the lock deadline for one (ip, email) pair.
pub fn lockout_marker(ip: &str, email: &str) -> String {
    format!("{PREFIX}:lockout:locked:{ip}:{}", email.to_lowercase())
}

// ── Activity keys ──────────────────────────────────────────

/// Last-activity marker written on each authenticated request.
pub fn user_activity(user_id: Uuid) -> String {
    format!("{PREFIX}:activity:{user_id}")
}

// ── Revocation keys ────────────────────────────────────────

/// Blacklist entry for a revoked token, keyed by its digest.
pub fn token_blacklist(token_hash: &str) -> String {
    format!("{PREFIX}:token:blocked:{token_hash}")
}

// ── Rate limiting keys ─────────────────────────────────────

/// Rate limit bucket for an endpoint and client identifier.
pub fn rate_limit(endpoint: &str, identifier: &str) -> String {
    format!("{PREFIX}:rate:{endpoint}:{identifier}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lockout_key_lowercases_email() {
        assert_eq!(
            lockout_counter("10.0.0.1", "A@X.com"),
            "atlas:lockout:count:10.0.0.1:a@x.com"
        );
    }

    #[test]
    fn test_activity_key() {
        let id = Uuid::nil();
        assert_eq!(
            user_activity(id),
            "atlas:activity:00000000-0000-0000-0000-000000000000"
        );
    }
}
