//! Session storage operations wrapping the database repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use atlas_core::config::SessionConfig;
use atlas_core::error::{AppError, codes};
use atlas_database::repositories::session::SessionRepository;
use atlas_entity::session::{NewSession, Session};

/// Abstracts session persistence operations.
///
/// One row per device; the raw refresh token never reaches this layer —
/// callers pass its digest.
#[derive(Debug, Clone)]
pub struct SessionStore {
    /// Session database repository.
    repo: Arc<SessionRepository>,
    /// Session configuration.
    config: SessionConfig,
}

impl SessionStore {
    /// Creates a new session store.
    pub fn new(repo: Arc<SessionRepository>, config: SessionConfig) -> Self {
        Self { repo, config }
    }

    /// Creates a new session record and enforces the per-user cap by
    /// evicting the oldest sessions past the limit.
    pub async fn add_session(
        &self,
        user_id: Uuid,
        token_hash: &str,
        device: Option<&str>,
        ip_address: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        let session = self
            .repo
            .create(&NewSession {
                user_id,
                token_hash: token_hash.to_string(),
                device: device.map(String::from),
                ip_address: ip_address.to_string(),
                expires_at,
            })
            .await?;

        let max = self.config.max_sessions_per_user as i64;
        let count = self.repo.count_by_user(user_id).await?;
        if count > max {
            let evicted = self.repo.delete_oldest_for_user(user_id, max).await?;
            warn!(
                user_id = %user_id,
                evicted,
                max_sessions = max,
                "Evicted oldest sessions over per-user cap"
            );
        }

        Ok(session)
    }

    /// Finds a live session by user and token hash.
    pub async fn find_session(
        &self,
        user_id: Uuid,
        token_hash: &str,
    ) -> Result<Option<Session>, AppError> {
        self.repo.find_by_user_and_hash(user_id, token_hash).await
    }

    /// Atomically replaces one session's token hash (refresh rotation).
    ///
    /// When `old_hash` matches no live row the token was already rotated
    /// out or revoked — a possible replay. Callers must fail the refresh
    /// and force re-authentication rather than silently succeeding.
    pub async fn rotate_session(
        &self,
        user_id: Uuid,
        old_hash: &str,
        new_hash: &str,
        device: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        self.repo
            .rotate(user_id, old_hash, new_hash, device, expires_at)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %user_id, "Rotation matched no session; treating as replay");
                AppError::authentication("Refresh token does not match an active session")
                    .with_code(codes::SESSION_NOT_FOUND)
            })
    }

    /// Removes one session (logout). Returns whether a row was removed.
    pub async fn remove_session(
        &self,
        user_id: Uuid,
        token_hash: &str,
    ) -> Result<bool, AppError> {
        self.repo.delete_by_user_and_hash(user_id, token_hash).await
    }

    /// Removes every session for a user (logout-all). Returns the count.
    pub async fn remove_all_sessions(&self, user_id: Uuid) -> Result<u64, AppError> {
        self.repo.delete_all_for_user(user_id).await
    }

    /// Updates `last_used_at` on a successful non-rotating refresh, for
    /// anomaly auditing.
    pub async fn touch_session(&self, user_id: Uuid, token_hash: &str) -> Result<(), AppError> {
        self.repo.touch(user_id, token_hash).await
    }

    /// Lists all live sessions for a user, newest first.
    pub async fn list_sessions(&self, user_id: Uuid) -> Result<Vec<Session>, AppError> {
        self.repo.find_by_user(user_id).await
    }
}
