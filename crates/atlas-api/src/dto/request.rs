//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use atlas_core::error::AppError;

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Login email.
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    /// Password (policy enforced server-side as well).
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    /// Display name.
    #[validate(length(max = 100, message = "Display name is too long"))]
    pub display_name: Option<String>,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login email.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Password change request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    /// Current password.
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    /// New password.
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Update profile request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    /// New display name.
    #[validate(length(max = 100, message = "Display name is too long"))]
    pub display_name: Option<String>,
}

/// Runs derive-based validation and folds the first violation into the
/// error taxonomy.
pub fn validated<T: Validate>(dto: T) -> Result<T, AppError> {
    if let Err(errors) = dto.validate() {
        let message = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for '{field}'"))
                })
            })
            .next()
            .unwrap_or_else(|| "Validation failed".to_string());
        return Err(AppError::validation(message));
    }
    Ok(dto)
}
