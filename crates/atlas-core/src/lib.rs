//! # atlas-core
//!
//! Core crate for the Atlas travel platform backend. Contains configuration
//! schemas, the unified error system, and shared traits.
//!
//! This crate has **no** internal dependencies on other Atlas crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
