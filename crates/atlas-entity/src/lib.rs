//! # atlas-entity
//!
//! Domain entities for the Atlas travel platform. Plain data structures
//! with `sqlx::FromRow` derives; all persistence logic lives in
//! `atlas-database`.

pub mod session;
pub mod user;

pub use session::Session;
pub use user::{PlanTier, User, UserRole, UserStatus};
