//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Authentication and credential configuration.
///
/// Both signing secrets have **no default**: the token issuer refuses to
/// construct when either is empty, which prevents the server from
/// starting with unsigned-equivalent tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for access token signing (HMAC-SHA256).
    #[serde(default)]
    pub access_token_secret: String,
    /// Separate secret key for refresh token signing (HMAC-SHA256).
    #[serde(default)]
    pub refresh_token_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: u64,
    /// Refresh token TTL in days.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_days: u64,
    /// Name of the HttpOnly cookie carrying the refresh token.
    #[serde(default = "default_cookie_name")]
    pub refresh_cookie_name: String,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Maximum failed login attempts before lockout.
    #[serde(default = "default_max_failed")]
    pub max_failed_attempts: u32,
    /// Lockout window in minutes.
    #[serde(default = "default_lockout_window")]
    pub lockout_window_minutes: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: String::new(),
            refresh_token_secret: String::new(),
            access_ttl_minutes: default_access_ttl(),
            refresh_ttl_days: default_refresh_ttl(),
            refresh_cookie_name: default_cookie_name(),
            password_min_length: default_password_min(),
            max_failed_attempts: default_max_failed(),
            lockout_window_minutes: default_lockout_window(),
        }
    }
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    7
}

fn default_cookie_name() -> String {
    "atlas_refresh".to_string()
}

fn default_password_min() -> usize {
    8
}

fn default_max_failed() -> u32 {
    5
}

fn default_lockout_window() -> u64 {
    15
}
