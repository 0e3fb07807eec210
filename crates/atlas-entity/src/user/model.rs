//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::plan::PlanTier;
use super::role::UserRole;
use super::status::UserStatus;

/// A registered user of the Atlas travel platform.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique login email (stored lowercased).
    pub email: String,
    /// Argon2id password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// User role (authorization).
    pub role: UserRole,
    /// Subscription plan tier (AI feature gating).
    pub plan: PlanTier,
    /// Account status.
    pub status: UserStatus,
    /// Whether the email address has been verified.
    pub email_verified: bool,
    /// When the password was last changed. Access tokens issued before
    /// this instant are rejected as stale.
    pub password_changed_at: DateTime<Utc>,
    /// Number of consecutive failed login attempts.
    pub failed_login_attempts: i32,
    /// Account locked until this time (if locked).
    pub locked_until: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Check if the user account is currently locked.
    pub fn is_locked(&self) -> bool {
        match self.locked_until {
            Some(until) => Utc::now() < until,
            None => false,
        }
    }

    /// Seconds remaining on the account lock (0 if not locked).
    pub fn lock_remaining_seconds(&self) -> u64 {
        match self.locked_until {
            Some(until) => {
                let remaining = (until - Utc::now()).num_seconds();
                if remaining > 0 { remaining as u64 } else { 0 }
            }
            None => 0,
        }
    }

    /// Check if the user can authenticate right now.
    pub fn can_login(&self) -> bool {
        self.status == UserStatus::Active && !self.is_locked()
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Login email.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Display name (optional).
    pub display_name: Option<String>,
    /// Assigned role.
    pub role: UserRole,
    /// Subscription plan tier.
    pub plan: PlanTier,
}

/// Data for updating an existing user's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New display name.
    pub display_name: Option<String>,
}
