//! The static permission table.
//!
//! Every permission the application checks is enumerated here. Role
//! lists are the primary grant; the tier lists on `ai.*` entries are
//! the alternative subscription-based grant.

use atlas_entity::user::{PlanTier, UserRole};

/// One row of the permission table.
#[derive(Debug, Clone, Copy)]
pub struct Permission {
    /// Permission name, dot-namespaced.
    pub name: &'static str,
    /// Roles granted this permission.
    pub roles: &'static [UserRole],
    /// Plan tiers granted this permission (only consulted for `ai.*`).
    pub tiers: &'static [PlanTier],
}

/// The complete permission table.
pub const PERMISSIONS: &[Permission] = &[
    Permission {
        name: "trips.read",
        roles: &[UserRole::User, UserRole::Admin],
        tiers: &[],
    },
    Permission {
        name: "trips.write",
        roles: &[UserRole::User, UserRole::Admin],
        tiers: &[],
    },
    Permission {
        name: "bookings.read",
        roles: &[UserRole::User, UserRole::Admin],
        tiers: &[],
    },
    Permission {
        name: "bookings.write",
        roles: &[UserRole::User, UserRole::Admin],
        tiers: &[],
    },
    Permission {
        name: "admin.users",
        roles: &[UserRole::Admin],
        tiers: &[],
    },
    Permission {
        name: "admin.sessions",
        roles: &[UserRole::Admin],
        tiers: &[],
    },
    Permission {
        name: "ai.itinerary",
        roles: &[UserRole::Admin],
        tiers: &[PlanTier::Pro, PlanTier::Elite],
    },
    Permission {
        name: "ai.suggestions",
        roles: &[UserRole::Admin],
        tiers: &[PlanTier::Pro, PlanTier::Elite],
    },
    Permission {
        name: "ai.concierge",
        roles: &[UserRole::Admin],
        tiers: &[PlanTier::Elite],
    },
];

/// Looks a permission up by name.
pub fn permission(name: &str) -> Option<&'static Permission> {
    PERMISSIONS.iter().find(|p| p.name == name)
}
