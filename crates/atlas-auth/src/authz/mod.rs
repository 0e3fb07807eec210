//! Role- and permission-based authorization.

pub mod policies;

use atlas_core::error::AppError;
use atlas_entity::user::{PlanTier, UserRole};

use policies::permission;

/// Checks that the caller holds one of the required roles.
pub fn require_role(role: UserRole, required: &[UserRole]) -> Result<(), AppError> {
    if required.contains(&role) {
        return Ok(());
    }
    Err(AppError::authorization(format!(
        "Requires one of the roles: {}",
        required
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )))
}

/// Checks a named permission against the static table.
///
/// A permission is granted when the caller's role appears in its role
/// list. Permissions namespaced `ai.*` carry an additional plan-tier
/// list: tier membership grants them even when the role grant misses.
pub fn check_permission(role: UserRole, plan: PlanTier, name: &str) -> Result<(), AppError> {
    let Some(perm) = permission(name) else {
        return Err(AppError::authorization(format!(
            "Unknown permission: {name}"
        )));
    };

    if perm.roles.contains(&role) {
        return Ok(());
    }

    if name.starts_with("ai.") && perm.tiers.contains(&plan) {
        return Ok(());
    }

    Err(AppError::authorization(format!(
        "Missing permission: {name}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_role() {
        assert!(require_role(UserRole::Admin, &[UserRole::Admin]).is_ok());
        assert!(require_role(UserRole::User, &[UserRole::Admin]).is_err());
        assert!(require_role(UserRole::User, &[UserRole::User, UserRole::Admin]).is_ok());
    }

    #[test]
    fn test_role_grants() {
        assert!(check_permission(UserRole::User, PlanTier::Free, "trips.read").is_ok());
        assert!(check_permission(UserRole::User, PlanTier::Free, "admin.users").is_err());
        assert!(check_permission(UserRole::Admin, PlanTier::Free, "admin.users").is_ok());
    }

    #[test]
    fn test_ai_tier_exception() {
        // Free tier, plain role: denied.
        assert!(check_permission(UserRole::User, PlanTier::Free, "ai.itinerary").is_err());
        // Pro tier grants the AI permission without the role grant.
        assert!(check_permission(UserRole::User, PlanTier::Pro, "ai.itinerary").is_ok());
        // Concierge needs Elite.
        assert!(check_permission(UserRole::User, PlanTier::Pro, "ai.concierge").is_err());
        assert!(check_permission(UserRole::User, PlanTier::Elite, "ai.concierge").is_ok());
        // Admins hold AI permissions by role regardless of tier.
        assert!(check_permission(UserRole::Admin, PlanTier::Free, "ai.concierge").is_ok());
    }

    #[test]
    fn test_tiers_do_not_leak_outside_ai_namespace() {
        // Tier lists only apply under the ai.* namespace.
        assert!(check_permission(UserRole::User, PlanTier::Elite, "admin.users").is_err());
    }

    #[test]
    fn test_unknown_permission_denied() {
        assert!(check_permission(UserRole::Admin, PlanTier::Elite, "no.such.permission").is_err());
    }
}
