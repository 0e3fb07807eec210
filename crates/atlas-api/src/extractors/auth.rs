//! `AuthUser` extractor — the per-request authentication gateway.
//!
//! Runs the fixed pipeline for every protected route:
//!
//! 1. bearer extraction        → `AUTH_NO_TOKEN`
//! 2. structural pre-check     → `AUTH_MALFORMED`
//! 3. blacklist hook           → `AUTH_REVOKED`
//! 4. cryptographic verify     → `AUTH_EXPIRED` / `AUTH_MALFORMED`
//! 5. identity load            → `AUTH_IDENTITY_MISSING`
//! 6. identity locked          → `ACCOUNT_LOCKED` (423)
//! 7. password-change check    → `AUTH_STALE_PASSWORD`
//! 8. activity recording, context attachment

use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;

use atlas_auth::token::{AccessClaims, TokenVerifier};
use atlas_cache::keys;
use atlas_core::error::{AppError, codes};
use atlas_core::traits::cache::CacheProvider;
use atlas_entity::user::{User, UserStatus};

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated request context available in handlers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The loaded identity.
    pub user: User,
    /// The verified access claims.
    pub claims: AccessClaims,
    /// Client IP address.
    pub ip_address: String,
    /// Client user-agent.
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Role-based authorization: 403 when the caller holds none of the
    /// required roles.
    pub fn authorize(&self, required: &[atlas_entity::user::UserRole]) -> Result<(), AppError> {
        atlas_auth::authz::require_role(self.user.role, required)
    }

    /// Permission-based authorization against the static table; `ai.*`
    /// permissions may alternatively be granted by the subscription tier.
    pub fn check_permission(&self, name: &str) -> Result<(), AppError> {
        atlas_auth::authz::check_permission(self.user.role, self.user.plan, name)
    }
}

/// Extracted authenticated user context.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Step 1: extract the bearer token.
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::authentication("Missing bearer token").with_code(codes::AUTH_NO_TOKEN)
            })?;

        // Step 2: reject garbage before any cryptographic work.
        if !TokenVerifier::is_valid_structure(token) {
            return Err(
                AppError::authentication("Malformed token")
                    .with_code(codes::AUTH_MALFORMED)
                    .into(),
            );
        }

        // Step 3: revocation-list hook (no-op by default).
        if state.blacklist.contains(token).await? {
            return Err(
                AppError::authentication("Token has been revoked")
                    .with_code(codes::AUTH_REVOKED)
                    .into(),
            );
        }

        // Step 4: signature, issuer, audience, expiry, type.
        let claims = state.verifier.verify_access_token(token)?;

        // Step 5: the identity must still exist and be active.
        let user = state
            .user_repo
            .find_by_id(claims.user_id())
            .await?
            .filter(|u| u.status == UserStatus::Active)
            .ok_or_else(|| {
                AppError::authentication("Account no longer exists or is deactivated")
                    .with_code(codes::AUTH_IDENTITY_MISSING)
            })?;

        // Step 6: a locked identity is refused with the retry hint.
        if user.is_locked() {
            return Err(
                AppError::locked("Account is locked", user.lock_remaining_seconds()).into(),
            );
        }

        // Step 7: tokens issued before the last password change are stale.
        if TokenVerifier::is_stale(&claims, &user) {
            return Err(
                AppError::authentication("Token predates a password change")
                    .with_code(codes::AUTH_STALE_PASSWORD)
                    .into(),
            );
        }

        // Step 8: record activity. Best-effort: a cache hiccup must not
        // fail the request.
        let ttl = Duration::from_secs(state.config.session.activity_ttl_minutes * 60);
        if let Err(e) = state
            .cache
            .set(
                &keys::user_activity(user.id),
                &Utc::now().timestamp().to_string(),
                ttl,
            )
            .await
        {
            tracing::debug!(error = %e, "Activity recording failed");
        }

        let ip_address = super::client_ip(&parts.headers);
        let user_agent = super::user_agent(&parts.headers);

        Ok(AuthUser(RequestContext {
            user,
            claims,
            ip_address,
            user_agent,
        }))
    }
}
