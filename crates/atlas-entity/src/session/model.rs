//! Session entity model.
//!
//! A session binds one refresh-token hash to a device and user. The raw
//! refresh token is never persisted; only its SHA-256 hex digest is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted refresh-token session for one device.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// SHA-256 hex digest of the raw refresh token.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Device descriptor (user-agent string).
    pub device: Option<String>,
    /// IP address the session originated from.
    pub ip_address: String,
    /// When the session (current refresh token) was issued.
    pub issued_at: DateTime<Utc>,
    /// When the refresh token was last used.
    pub last_used_at: DateTime<Utc>,
    /// When the refresh token expires.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Check whether the session's refresh token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Data required to create a new session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
    /// Owning user.
    pub user_id: Uuid,
    /// SHA-256 hex digest of the raw refresh token.
    pub token_hash: String,
    /// Device descriptor (user-agent string).
    pub device: Option<String>,
    /// Originating IP address.
    pub ip_address: String,
    /// When the refresh token expires.
    pub expires_at: DateTime<Utc>,
}
