//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atlas_entity::session::Session;
use atlas_entity::user::User;

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Login email.
    pub email: String,
    /// Display name.
    pub display_name: Option<String>,
    /// Role.
    pub role: String,
    /// Subscription plan tier.
    pub plan: String,
    /// Whether the email was verified.
    pub email_verified: bool,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role.to_string(),
            plan: user.plan.to_string(),
            email_verified: user.email_verified,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Response to a successful registration or login. The refresh token
/// travels only in the cookie, never in this body; the contract requires
/// the caller to hold the access token in memory only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Short-lived access token.
    pub access_token: String,
    /// Seconds until the access token expires.
    pub expires_in: u64,
    /// The authenticated user.
    pub user: UserResponse,
}

/// Response to a successful refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// Newly minted access token.
    pub access_token: String,
    /// Seconds until the access token expires.
    pub expires_in: u64,
}

/// Response to logout-all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutAllResponse {
    /// Number of sessions removed.
    pub revoked_count: u64,
}

/// Public view of an active session (devices listing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Session ID.
    pub id: Uuid,
    /// Device descriptor.
    pub device: Option<String>,
    /// Originating IP address.
    pub ip_address: String,
    /// When the session was issued.
    pub issued_at: DateTime<Utc>,
    /// When the refresh token was last used.
    pub last_used_at: DateTime<Utc>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            device: session.device.clone(),
            ip_address: session.ip_address.clone(),
            issued_at: session.issued_at,
            last_used_at: session.last_used_at,
        }
    }
}

/// Generic message body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

impl MessageResponse {
    /// Builds a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
