//! Password policy enforcement for new passwords.

use atlas_core::config::AuthConfig;
use atlas_core::error::AppError;

/// Validates password strength against configured policies.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    /// Minimum password length.
    min_length: usize,
}

impl PasswordValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Validates a password against all configured policies.
    ///
    /// Returns `Ok(())` if the password meets all requirements,
    /// or an error describing the first violation found.
    pub fn validate(&self, password: &str) -> Result<(), AppError> {
        if password.len() < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        if !password.chars().any(|c| c.is_uppercase()) {
            return Err(AppError::validation(
                "Password must contain at least one uppercase letter",
            ));
        }

        if !password.chars().any(|c| c.is_lowercase()) {
            return Err(AppError::validation(
                "Password must contain at least one lowercase letter",
            ));
        }

        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AppError::validation(
                "Password must contain at least one digit",
            ));
        }

        // Entropy estimate is advisory: character-class rules are the gate,
        // weak-but-compliant passwords are logged for ops visibility.
        let estimate = zxcvbn::zxcvbn(password, &[]);
        if estimate.score() < zxcvbn::Score::Three {
            tracing::debug!(score = ?estimate.score(), "Accepted low-entropy password");
        }

        Ok(())
    }

    /// Validates that a new password differs from the old one.
    pub fn validate_not_same(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if old_password == new_password {
            return Err(AppError::validation(
                "New password must be different from the current password",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> PasswordValidator {
        PasswordValidator::new(&AuthConfig::default())
    }

    #[test]
    fn test_rejects_short_password() {
        assert!(validator().validate("Ab1").is_err());
    }

    #[test]
    fn test_rejects_missing_digit() {
        assert!(validator().validate("NoDigitsHere").is_err());
    }

    #[test]
    fn test_accepts_reasonable_password() {
        assert!(validator().validate("Passw0rd1").is_ok());
    }

    #[test]
    fn test_rejects_same_password() {
        assert!(validator().validate_not_same("Same1Aa!", "Same1Aa!").is_err());
        assert!(validator().validate_not_same("Old1Aa!x", "New1Aa!x").is_ok());
    }
}
