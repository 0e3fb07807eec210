//! Application-wide result alias.

use crate::error::AppError;

/// Result alias used across all Atlas crates.
pub type AppResult<T> = Result<T, AppError>;
