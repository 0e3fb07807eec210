//! Session lifecycle manager — register, login, refresh, logout,
//! password-change flows.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use atlas_core::config::AuthConfig;
use atlas_core::error::{AppError, codes};
use atlas_database::repositories::user::UserRepository;
use atlas_entity::session::Session;
use atlas_entity::user::{NewUser, PlanTier, User, UserRole, UserStatus};
use atlas_notify::Notifier;

use crate::lockout::LockoutGuard;
use crate::password::{PasswordHasher, PasswordValidator};
use crate::token::issuer::TokenPair;
use crate::token::{TokenIssuer, TokenVerifier};

use super::rotation::RotationPolicy;
use super::store::SessionStore;
use super::token_digest;

/// Result of a successful registration or login.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    /// Generated token pair.
    pub tokens: TokenPair,
    /// The authenticated user.
    pub user: User,
}

/// Result of a successful refresh.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// Newly minted access token.
    pub access_token: String,
    /// Access token expiration timestamp.
    pub access_expires_at: DateTime<Utc>,
    /// Replacement refresh token when the policy rotated, with its expiry.
    pub rotated_refresh: Option<(String, DateTime<Utc>)>,
}

/// Registration input after DTO validation.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Login email.
    pub email: String,
    /// Plaintext password (hashed here, never stored).
    pub password: String,
    /// Display name (optional).
    pub display_name: Option<String>,
}

/// Manages the complete session lifecycle.
#[derive(Clone)]
pub struct SessionManager {
    /// Token issuance.
    issuer: Arc<TokenIssuer>,
    /// Token validation.
    verifier: Arc<TokenVerifier>,
    /// Session persistence.
    store: Arc<SessionStore>,
    /// User repository.
    user_repo: Arc<UserRepository>,
    /// Password hashing.
    hasher: Arc<PasswordHasher>,
    /// Password policy.
    password_validator: Arc<PasswordValidator>,
    /// Failed-login tracking.
    lockout: Arc<LockoutGuard>,
    /// Refresh rotation decision.
    rotation: Arc<dyn RotationPolicy>,
    /// Fire-and-forget notification sink.
    notifier: Arc<dyn Notifier>,
    /// Auth configuration.
    config: AuthConfig,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("rotation", &self.rotation)
            .finish()
    }
}

impl SessionManager {
    /// Creates a new session manager with all required dependencies.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        issuer: Arc<TokenIssuer>,
        verifier: Arc<TokenVerifier>,
        store: Arc<SessionStore>,
        user_repo: Arc<UserRepository>,
        hasher: Arc<PasswordHasher>,
        password_validator: Arc<PasswordValidator>,
        lockout: Arc<LockoutGuard>,
        rotation: Arc<dyn RotationPolicy>,
        notifier: Arc<dyn Notifier>,
        config: AuthConfig,
    ) -> Self {
        Self {
            issuer,
            verifier,
            store,
            user_repo,
            hasher,
            password_validator,
            lockout,
            rotation,
            notifier,
            config,
        }
    }

    /// Registers a new account and opens its first session.
    ///
    /// 1. Enforce the password policy
    /// 2. Hash and create the user (duplicate email → conflict)
    /// 3. Issue a token pair and persist the refresh session
    /// 4. Fire the welcome notification
    pub async fn register(
        &self,
        registration: Registration,
        ip_address: &str,
        device: Option<&str>,
    ) -> Result<AuthOutcome, AppError> {
        self.password_validator.validate(&registration.password)?;

        let password_hash = self.hasher.hash_password(&registration.password)?;
        let user = self
            .user_repo
            .create(&NewUser {
                email: registration.email,
                password_hash,
                display_name: registration.display_name,
                role: UserRole::User,
                plan: PlanTier::Free,
            })
            .await?;

        let outcome = self
            .open_session(&user, ip_address, device)
            .await?;

        info!(user_id = %user.id, ip = ip_address, "Account registered");
        self.spawn_welcome(&user);

        Ok(outcome)
    }

    /// Performs the complete login flow:
    ///
    /// 1. Lockout check for the (origin, email) identifier
    /// 2. Credential check — every failure feeds the lockout guard
    /// 3. Account status and persistent-lock checks
    /// 4. Counter reset, token issuance, session persistence
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        ip_address: &str,
        device: Option<&str>,
    ) -> Result<AuthOutcome, AppError> {
        // Step 1: refuse early while the identifier is locked, regardless
        // of credential correctness.
        let status = self.lockout.check(ip_address, email).await?;
        if status.locked {
            return Err(AppError::locked(
                "Too many failed attempts. Try again later.",
                status.retry_after_seconds,
            ));
        }

        // Step 2: find the user. Unknown emails still feed the counter so
        // enumeration attempts lock the same way wrong passwords do.
        let Some(user) = self.user_repo.find_by_email(email).await? else {
            self.lockout.record_failure(ip_address, email).await?;
            return Err(invalid_credentials());
        };

        // Step 3: account-level checks.
        if user.status != UserStatus::Active {
            return Err(
                AppError::authentication("Account is deactivated")
                    .with_code(codes::AUTH_IDENTITY_MISSING),
            );
        }
        if user.is_locked() {
            return Err(AppError::locked(
                "Account is locked. Try again later.",
                user.lock_remaining_seconds(),
            ));
        }

        // Step 4: verify the password.
        if !self.hasher.verify_password(password, &user.password_hash)? {
            let failures = self.lockout.record_failure(ip_address, email).await?;
            self.persist_failure(&user, failures, ip_address, email).await?;
            return Err(invalid_credentials());
        }

        // Step 5: success clears both the guard and the user counters.
        self.lockout.record_success(ip_address, email).await?;
        if user.failed_login_attempts > 0 {
            self.user_repo.reset_failed_attempts(user.id).await?;
        }

        let outcome = self.open_session(&user, ip_address, device).await?;

        let _ = self.user_repo.update_last_login(user.id).await;
        info!(user_id = %user.id, ip = ip_address, "Login successful");

        Ok(outcome)
    }

    /// Refreshes an access token using a valid refresh token.
    ///
    /// 1. Verify the refresh JWT
    /// 2. Look the session up by digest — absence is a revocation/replay
    /// 3. Re-load the user (role or status may have changed)
    /// 4. Mint a new access token; rotate or touch per the policy
    pub async fn refresh(
        &self,
        raw_refresh_token: &str,
        device: Option<&str>,
    ) -> Result<RefreshOutcome, AppError> {
        let claims = self.verifier.verify_refresh_token(raw_refresh_token)?;
        let user_id = claims.user_id();
        let old_hash = token_digest(raw_refresh_token);

        let session = self
            .store
            .find_session(user_id, &old_hash)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %user_id, "Refresh token not in session store");
                AppError::authentication("Refresh token has been revoked")
                    .with_code(codes::AUTH_REVOKED)
            })?;

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .filter(|u| u.status == UserStatus::Active)
            .ok_or_else(|| {
                AppError::authentication("Account no longer exists or is deactivated")
                    .with_code(codes::AUTH_IDENTITY_MISSING)
            })?;

        if user.is_locked() {
            return Err(AppError::locked(
                "Account is locked. Try again later.",
                user.lock_remaining_seconds(),
            ));
        }

        let (access_token, access_expires_at) = self.issuer.generate_access_token(&user)?;

        let rotated_refresh = if self.rotation.should_rotate() {
            let (new_refresh, refresh_expires_at) =
                self.issuer.generate_refresh_token(user.id)?;
            let new_hash = token_digest(&new_refresh);
            self.store
                .rotate_session(user.id, &old_hash, &new_hash, device, refresh_expires_at)
                .await?;
            info!(user_id = %user.id, "Refresh token rotated");
            Some((new_refresh, refresh_expires_at))
        } else {
            self.store.touch_session(user.id, &session.token_hash).await?;
            None
        };

        Ok(RefreshOutcome {
            access_token,
            access_expires_at,
            rotated_refresh,
        })
    }

    /// Removes the session behind the presented refresh token (logout).
    ///
    /// Idempotent: a token that no longer matches a session is already
    /// logged out. The still-valid access token is not revoked — it
    /// expires naturally.
    pub async fn logout(&self, user_id: Uuid, raw_refresh_token: &str) -> Result<(), AppError> {
        let hash = token_digest(raw_refresh_token);
        let removed = self.store.remove_session(user_id, &hash).await?;
        if removed {
            info!(user_id = %user_id, "Logout completed");
        } else {
            warn!(user_id = %user_id, "Logout for unknown session (already removed)");
        }
        Ok(())
    }

    /// Removes every session for the user (logout-all). Returns the count.
    pub async fn logout_all(&self, user_id: Uuid) -> Result<u64, AppError> {
        let count = self.store.remove_all_sessions(user_id).await?;
        info!(user_id = %user_id, count, "All sessions removed");
        Ok(count)
    }

    /// Changes the password and revokes every session.
    ///
    /// Bumping `password_changed_at` invalidates all outstanding access
    /// tokens issued before the change; removing the sessions invalidates
    /// all refresh tokens.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
        ip_address: &str,
    ) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if !self
            .hasher
            .verify_password(current_password, &user.password_hash)?
        {
            return Err(AppError::authentication("Current password is incorrect"));
        }

        self.password_validator
            .validate_not_same(current_password, new_password)?;
        self.password_validator.validate(new_password)?;

        let new_hash = self.hasher.hash_password(new_password)?;
        self.user_repo.update_password(user_id, &new_hash).await?;

        let revoked = self.store.remove_all_sessions(user_id).await?;
        info!(user_id = %user_id, revoked, "Password changed, sessions revoked");

        self.spawn_security_alert(&user, "password_changed", ip_address);

        Ok(())
    }

    /// Lists the user's active sessions for the devices view.
    pub async fn active_sessions(&self, user_id: Uuid) -> Result<Vec<Session>, AppError> {
        self.store.list_sessions(user_id).await
    }

    /// Issues a token pair and persists the refresh session.
    async fn open_session(
        &self,
        user: &User,
        ip_address: &str,
        device: Option<&str>,
    ) -> Result<AuthOutcome, AppError> {
        let tokens = self.issuer.generate_token_pair(user)?;
        let refresh_hash = token_digest(&tokens.refresh_token);

        self.store
            .add_session(
                user.id,
                &refresh_hash,
                device,
                ip_address,
                tokens.refresh_expires_at,
            )
            .await?;

        Ok(AuthOutcome {
            tokens,
            user: user.clone(),
        })
    }

    /// Mirrors guard failures onto the user row so the lock survives
    /// cache eviction, and alerts the user at the threshold.
    async fn persist_failure(
        &self,
        user: &User,
        failures: u32,
        ip_address: &str,
        email: &str,
    ) -> Result<(), AppError> {
        let attempts = self.user_repo.increment_failed_attempts(user.id).await?;

        if failures >= self.config.max_failed_attempts
            || attempts >= self.config.max_failed_attempts as i32
        {
            let until =
                Utc::now() + chrono::Duration::minutes(self.config.lockout_window_minutes as i64);
            self.user_repo.lock_until(user.id, until).await?;
            warn!(
                user_id = %user.id,
                attempts,
                locked_until = %until,
                "User account locked after failed login attempts"
            );
            self.spawn_security_alert(user, "account_locked", ip_address);
        } else {
            tracing::debug!(email, attempts, "Failed login attempt recorded");
        }

        Ok(())
    }

    /// Fire-and-forget welcome mail.
    fn spawn_welcome(&self, user: &User) {
        let notifier = Arc::clone(&self.notifier);
        let email = user.email.clone();
        let name = user.display_name.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send_welcome(&email, name.as_deref()).await {
                warn!(error = %e, "Welcome notification failed");
            }
        });
    }

    /// Fire-and-forget security alert.
    fn spawn_security_alert(&self, user: &User, event: &'static str, ip_address: &str) {
        let notifier = Arc::clone(&self.notifier);
        let email = user.email.clone();
        let ip = ip_address.to_string();
        tokio::spawn(async move {
            if let Err(e) = notifier.send_security_alert(&email, event, &ip).await {
                warn!(error = %e, event, "Security alert notification failed");
            }
        });
    }
}

/// The uniform bad-credentials error: never distinguishes unknown email
/// from wrong password.
fn invalid_credentials() -> AppError {
    AppError::authentication("Invalid email or password")
}
