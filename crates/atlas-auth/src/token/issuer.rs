//! JWT token creation with split signing secrets.

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use atlas_core::config::AuthConfig;
use atlas_core::error::AppError;
use atlas_entity::user::User;

use super::claims::{AccessClaims, RefreshClaims, TokenType};
use super::{TOKEN_AUDIENCE, TOKEN_ISSUER};

/// Result of a successful token pair generation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token. Transported only via the refresh cookie
    /// and persisted only as a hash.
    pub refresh_token: String,
    /// Access token expiration timestamp.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration timestamp.
    pub refresh_expires_at: DateTime<Utc>,
}

/// Creates signed JWT access and refresh tokens.
///
/// Access and refresh tokens are signed with separate secrets so that a
/// leaked access secret cannot mint refresh tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    /// HMAC key for access token signing.
    access_key: EncodingKey,
    /// HMAC key for refresh token signing.
    refresh_key: EncodingKey,
    /// Access token TTL in minutes.
    access_ttl_minutes: i64,
    /// Refresh token TTL in days.
    refresh_ttl_days: i64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

impl TokenIssuer {
    /// Creates a new issuer from auth configuration.
    ///
    /// Fails with a configuration error when either signing secret is
    /// empty — this must abort server startup.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        if config.access_token_secret.is_empty() {
            return Err(AppError::configuration(
                "auth.access_token_secret is not set",
            ));
        }
        if config.refresh_token_secret.is_empty() {
            return Err(AppError::configuration(
                "auth.refresh_token_secret is not set",
            ));
        }

        Ok(Self {
            access_key: EncodingKey::from_secret(config.access_token_secret.as_bytes()),
            refresh_key: EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            access_ttl_minutes: config.access_ttl_minutes as i64,
            refresh_ttl_days: config.refresh_ttl_days as i64,
        })
    }

    /// Access token lifetime in seconds, for `expires_in` response fields.
    pub fn access_ttl_seconds(&self) -> u64 {
        (self.access_ttl_minutes * 60) as u64
    }

    /// Refresh token lifetime in seconds, for the cookie max-age.
    pub fn refresh_ttl_seconds(&self) -> u64 {
        (self.refresh_ttl_days * 86400) as u64
    }

    /// Generates a standalone access token for the given user.
    pub fn generate_access_token(
        &self,
        user: &User,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let now = Utc::now();
        let exp = now + chrono::Duration::minutes(self.access_ttl_minutes);

        let claims = AccessClaims {
            sub: user.id,
            role: user.role,
            plan: user.plan,
            email_verified: user.email_verified,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            token_type: TokenType::Access,
        };

        let token = encode(&Header::default(), &claims, &self.access_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))?;

        Ok((token, exp))
    }

    /// Generates a standalone refresh token with a fresh random `jti`.
    pub fn generate_refresh_token(
        &self,
        user_id: Uuid,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let now = Utc::now();
        let exp = now + chrono::Duration::days(self.refresh_ttl_days);

        let claims = RefreshClaims {
            sub: user_id,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            token_type: TokenType::Refresh,
        };

        let token = encode(&Header::default(), &claims, &self.refresh_key)
            .map_err(|e| AppError::internal(format!("Failed to encode refresh token: {e}")))?;

        Ok((token, exp))
    }

    /// Generates a new access + refresh token pair for the given user.
    pub fn generate_token_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        let (access_token, access_expires_at) = self.generate_access_token(user)?;
        let (refresh_token, refresh_expires_at) = self.generate_refresh_token(user.id)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }
}
