//! Session repository implementation.
//!
//! Every mutation is a single conditional SQL statement so concurrent
//! refresh calls against the same user's session list serialize at the
//! database. A rotation whose predicate no longer matches affects zero
//! rows and surfaces as a replay to the caller.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use atlas_core::error::{AppError, ErrorKind};
use atlas_core::result::AppResult;
use atlas_entity::session::{NewSession, Session};

/// Repository for refresh-token session records.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new session record.
    pub async fn create(&self, data: &NewSession) -> AppResult<Session> {
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (user_id, token_hash, device, ip_address, expires_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING *",
        )
        .bind(data.user_id)
        .bind(&data.token_hash)
        .bind(&data.device)
        .bind(&data.ip_address)
        .bind(data.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))
    }

    /// Find a live (unexpired) session by user and token hash.
    pub async fn find_by_user_and_hash(
        &self,
        user_id: Uuid,
        token_hash: &str,
    ) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions \
             WHERE user_id = $1 AND token_hash = $2 AND expires_at > NOW()",
        )
        .bind(user_id)
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find session by hash", e)
        })
    }

    /// List all live sessions for a user, newest first.
    pub async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE user_id = $1 AND expires_at > NOW() \
             ORDER BY issued_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list sessions", e))
    }

    /// Count live sessions for a user.
    pub async fn count_by_user(&self, user_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sessions WHERE user_id = $1 AND expires_at > NOW()",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count sessions", e))?;
        Ok(count)
    }

    /// Atomically replace one session's token hash (refresh rotation).
    ///
    /// Returns `None` when no row matched the old hash — the token was
    /// already rotated out or revoked, which callers must treat as a
    /// possible replay.
    pub async fn rotate(
        &self,
        user_id: Uuid,
        old_hash: &str,
        new_hash: &str,
        device: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "UPDATE sessions \
             SET token_hash = $3, device = COALESCE($4, device), \
                 issued_at = NOW(), last_used_at = NOW(), expires_at = $5 \
             WHERE user_id = $1 AND token_hash = $2 AND expires_at > NOW() \
             RETURNING *",
        )
        .bind(user_id)
        .bind(old_hash)
        .bind(new_hash)
        .bind(device)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rotate session", e))
    }

    /// Bump `last_used_at` on a successful refresh without rotation.
    pub async fn touch(&self, user_id: Uuid, token_hash: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE sessions SET last_used_at = NOW() WHERE user_id = $1 AND token_hash = $2",
        )
        .bind(user_id)
        .bind(token_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to touch session", e))?;
        Ok(())
    }

    /// Delete one session by user and token hash. Returns whether a row was removed.
    pub async fn delete_by_user_and_hash(
        &self,
        user_id: Uuid,
        token_hash: &str,
    ) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND token_hash = $2")
                .bind(user_id)
                .bind(token_hash)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to delete session", e)
                })?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every session for a user. Returns the number removed.
    pub async fn delete_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete sessions", e)
            })?;

        Ok(result.rows_affected())
    }

    /// Delete the oldest sessions for a user until only `keep` remain.
    ///
    /// Used to enforce the per-user session cap on login. Rows are ranked
    /// newest-first; everything past the `keep` newest is removed.
    pub async fn delete_oldest_for_user(&self, user_id: Uuid, keep: i64) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM sessions WHERE id IN ( \
                 SELECT id FROM sessions WHERE user_id = $1 AND expires_at > NOW() \
                 ORDER BY issued_at DESC \
                 OFFSET $2 \
             )",
        )
        .bind(user_id)
        .bind(keep)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to evict oldest sessions", e)
        })?;

        Ok(result.rows_affected())
    }

    /// Delete all expired session rows (maintenance).
    pub async fn delete_expired(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete expired sessions", e)
            })?;

        Ok(result.rows_affected())
    }
}
