//! # atlas-auth
//!
//! Authentication and session lifecycle for the Atlas travel platform.
//!
//! ## Modules
//!
//! - `token` — JWT issuance, verification, and the revocation-list seam
//! - `password` — Argon2id password hashing and policy enforcement
//! - `session` — refresh-token session store, rotation policy, and the
//!   lifecycle manager (register, login, refresh, logout, password change)
//! - `lockout` — failed-login tracking keyed by (network origin, email)
//! - `authz` — role checks and the static permission table

pub mod authz;
pub mod lockout;
pub mod password;
pub mod session;
pub mod token;

pub use authz::{check_permission, require_role};
pub use lockout::{LockoutGuard, LockoutStatus};
pub use password::{PasswordHasher, PasswordValidator};
pub use session::{RotationPolicy, SessionManager, SessionStore};
pub use token::{TokenIssuer, TokenVerifier};
