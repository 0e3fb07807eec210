//! JWT token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use atlas_core::config::AuthConfig;
use atlas_core::error::{AppError, codes};
use atlas_entity::user::User;

use super::claims::{AccessClaims, RefreshClaims, TokenType};
use super::{TOKEN_AUDIENCE, TOKEN_ISSUER};

/// Validates JWT tokens against the split signing secrets.
#[derive(Clone)]
pub struct TokenVerifier {
    /// HMAC key for access token verification.
    access_key: DecodingKey,
    /// HMAC key for refresh token verification.
    refresh_key: DecodingKey,
    /// Validation configuration (signature, expiry, issuer, audience).
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    /// Creates a new verifier from auth configuration.
    ///
    /// Like the issuer, refuses to construct with empty secrets.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        if config.access_token_secret.is_empty() || config.refresh_token_secret.is_empty() {
            return Err(AppError::configuration("Token signing secrets are not set"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // seconds of clock skew tolerated
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_audience(&[TOKEN_AUDIENCE]);

        Ok(Self {
            access_key: DecodingKey::from_secret(config.access_token_secret.as_bytes()),
            refresh_key: DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            validation,
        })
    }

    /// Cheap syntactic pre-check: exactly three non-empty dot-separated
    /// segments. Rejects garbage before any cryptographic work.
    pub fn is_valid_structure(token: &str) -> bool {
        let segments: Vec<&str> = token.split('.').collect();
        segments.len() == 3 && segments.iter().all(|s| !s.is_empty())
    }

    /// Decodes and validates an access token string.
    ///
    /// Checks signature, issuer, audience, expiry, and token type.
    /// Expiry maps to `AUTH_EXPIRED`; every other failure maps to
    /// `AUTH_MALFORMED`.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AppError> {
        let data = decode::<AccessClaims>(token, &self.access_key, &self.validation)
            .map_err(map_decode_error)?;

        if data.claims.token_type != TokenType::Access {
            return Err(AppError::authentication("Invalid token type: expected access token")
                .with_code(codes::AUTH_MALFORMED));
        }

        Ok(data.claims)
    }

    /// Decodes and validates a refresh token string.
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, AppError> {
        let data = decode::<RefreshClaims>(token, &self.refresh_key, &self.validation)
            .map_err(map_decode_error)?;

        if data.claims.token_type != TokenType::Refresh {
            return Err(
                AppError::authentication("Invalid token type: expected refresh token")
                    .with_code(codes::AUTH_MALFORMED),
            );
        }

        Ok(data.claims)
    }

    /// Checks whether the access token predates the user's last password
    /// change. Such tokens are otherwise valid but must be rejected.
    pub fn is_stale(claims: &AccessClaims, user: &User) -> bool {
        claims.issued_at() < user.password_changed_at
    }
}

/// Maps a jsonwebtoken decode error to the taxonomy: expired tokens keep
/// their own code, everything else is malformed.
fn map_decode_error(e: jsonwebtoken::errors::Error) -> AppError {
    match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::authentication("Token has expired").with_code(codes::AUTH_EXPIRED)
        }
        _ => AppError::with_source(
            atlas_core::error::ErrorKind::Authentication,
            "Token validation failed",
            e,
        )
        .with_code(codes::AUTH_MALFORMED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenIssuer;
    use atlas_core::config::AuthConfig;
    use atlas_entity::user::{PlanTier, User, UserRole, UserStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn test_config() -> AuthConfig {
        AuthConfig {
            access_token_secret: "access-secret-for-tests".to_string(),
            refresh_token_secret: "refresh-secret-for-tests".to_string(),
            ..AuthConfig::default()
        }
    }

    fn test_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: String::new(),
            display_name: None,
            role: UserRole::User,
            plan: PlanTier::Pro,
            status: UserStatus::Active,
            email_verified: true,
            password_changed_at: now - chrono::Duration::days(1),
            failed_login_attempts: 0,
            locked_until: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    #[test]
    fn test_structure_check() {
        assert!(TokenVerifier::is_valid_structure("aaa.bbb.ccc"));
        assert!(!TokenVerifier::is_valid_structure("aaa.bbb"));
        assert!(!TokenVerifier::is_valid_structure("aaa..ccc"));
        assert!(!TokenVerifier::is_valid_structure(""));
        assert!(!TokenVerifier::is_valid_structure("not a token"));
    }

    #[test]
    fn test_access_token_round_trip() {
        let config = test_config();
        let issuer = TokenIssuer::new(&config).unwrap();
        let verifier = TokenVerifier::new(&config).unwrap();
        let user = test_user();

        let (token, _exp) = issuer.generate_access_token(&user).unwrap();
        assert!(TokenVerifier::is_valid_structure(&token));

        let claims = verifier.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, UserRole::User);
        assert_eq!(claims.plan, PlanTier::Pro);
        assert!(claims.email_verified);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_refresh_token_round_trip_has_unique_jti() {
        let config = test_config();
        let issuer = TokenIssuer::new(&config).unwrap();
        let verifier = TokenVerifier::new(&config).unwrap();
        let user_id = Uuid::new_v4();

        let (t1, _) = issuer.generate_refresh_token(user_id).unwrap();
        let (t2, _) = issuer.generate_refresh_token(user_id).unwrap();

        let c1 = verifier.verify_refresh_token(&t1).unwrap();
        let c2 = verifier.verify_refresh_token(&t2).unwrap();
        assert_eq!(c1.sub, user_id);
        assert_ne!(c1.jti, c2.jti);
    }

    #[test]
    fn test_expired_token_reports_expired() {
        use crate::token::{TOKEN_AUDIENCE, TOKEN_ISSUER};

        let config = test_config();
        let verifier = TokenVerifier::new(&config).unwrap();
        let user = test_user();
        let now = Utc::now();

        // Hand-craft a token whose expiry is well past the leeway.
        let claims = AccessClaims {
            sub: user.id,
            role: user.role,
            plan: user.plan,
            email_verified: user.email_verified,
            iat: (now - chrono::Duration::minutes(30)).timestamp(),
            exp: (now - chrono::Duration::minutes(15)).timestamp(),
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            token_type: TokenType::Access,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(config.access_token_secret.as_bytes()),
        )
        .unwrap();

        let err = verifier.verify_access_token(&token).unwrap_err();
        assert_eq!(err.code, Some(codes::AUTH_EXPIRED));
    }

    #[test]
    fn test_wrong_key_rejected_as_malformed() {
        let config = test_config();
        let issuer = TokenIssuer::new(&config).unwrap();
        let verifier = TokenVerifier::new(&config).unwrap();
        let user = test_user();

        // A refresh token is signed with the refresh secret; verifying it
        // as an access token must fail before the type check is reached.
        let (refresh, _) = issuer.generate_refresh_token(user.id).unwrap();
        let err = verifier.verify_access_token(&refresh).unwrap_err();
        assert_eq!(err.code, Some(codes::AUTH_MALFORMED));
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let config = AuthConfig::default();
        assert!(TokenIssuer::new(&config).is_err());
        assert!(TokenVerifier::new(&config).is_err());
    }

    #[test]
    fn test_stale_detection() {
        let config = test_config();
        let issuer = TokenIssuer::new(&config).unwrap();
        let verifier = TokenVerifier::new(&config).unwrap();
        let mut user = test_user();

        let (token, _) = issuer.generate_access_token(&user).unwrap();
        let claims = verifier.verify_access_token(&token).unwrap();
        assert!(!TokenVerifier::is_stale(&claims, &user));

        // A password change after issuance makes the token stale.
        user.password_changed_at = Utc::now() + chrono::Duration::seconds(5);
        assert!(TokenVerifier::is_stale(&claims, &user));
    }
}
