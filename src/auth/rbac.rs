/*!
 * # Role-Based Access Control (RBAC) Module
 *
 * Roles themselves are database rows (name, price visibility, description).
 * This module holds the static permission catalog keyed by role name.
 */

use super::permissions::consts;
use lazy_static::lazy_static;
use std::collections::HashMap;
use tracing::debug;

/// Role definition with associated permissions
#[derive(Debug, Clone)]
pub struct RoleDefinition {
    pub name: &'static str,
    pub description: &'static str,
    /// Default for the `can_view_prices` column when the role is seeded.
    pub can_view_prices: bool,
    pub permissions: Vec<&'static str>,
}

pub const ADMIN_ROLE: &str = "Admin";
pub const MANAGEMENT_ROLE: &str = "Management";

lazy_static! {
    /// Seeded roles, in insertion order.
    pub static ref DEFAULT_ROLES: Vec<RoleDefinition> = vec![
        RoleDefinition {
            name: ADMIN_ROLE,
            description: "System administrator with full access",
            can_view_prices: true,
            permissions: vec![consts::ALL],
        },
        RoleDefinition {
            name: MANAGEMENT_ROLE,
            description: "Management and general direction",
            can_view_prices: true,
            permissions: vec![
                consts::USERS_READ,
                consts::USERS_CREATE,
                consts::USERS_UPDATE,
                consts::INSPECTIONS_DELETE,
            ],
        },
        RoleDefinition {
            name: "Quality",
            description: "Quality control personnel",
            can_view_prices: false,
            permissions: vec![],
        },
        RoleDefinition {
            name: "Operator",
            description: "Production operators",
            can_view_prices: false,
            permissions: vec![],
        },
        RoleDefinition {
            name: "Supervisor",
            description: "Production supervisors",
            can_view_prices: false,
            permissions: vec![],
        },
        RoleDefinition {
            name: "Planner",
            description: "Production planners",
            can_view_prices: false,
            permissions: vec![],
        },
        RoleDefinition {
            name: "Warehouse",
            description: "Warehouse personnel",
            can_view_prices: true,
            permissions: vec![],
        },
        RoleDefinition {
            name: "Shipping",
            description: "Shipping personnel",
            can_view_prices: true,
            permissions: vec![],
        },
    ];

    static ref ROLES: HashMap<&'static str, &'static RoleDefinition> =
        DEFAULT_ROLES.iter().map(|role| (role.name, role)).collect();
}

/// Get a role definition by name
pub fn get_role(role_name: &str) -> Option<&'static RoleDefinition> {
    ROLES.get(role_name).copied()
}

/// Permissions granted to a role; unknown roles get none.
pub fn permissions_for_role(role_name: Option<&str>) -> Vec<String> {
    match role_name.and_then(get_role) {
        Some(role) => role.permissions.iter().map(|p| p.to_string()).collect(),
        None => {
            debug!(role = ?role_name, "role has no catalogued permissions");
            vec![]
        }
    }
}

/// Check if a specific permission matches a required permission
pub fn check_permission(user_permission: &str, required_permission: &str) -> bool {
    // Direct match
    if user_permission == required_permission {
        return true;
    }

    // Super wildcard (admin)
    if user_permission == consts::ALL {
        return true;
    }

    // Resource wildcard
    if let Some(prefix) = user_permission.strip_suffix(":*") {
        if let Some((resource, _)) = required_permission.split_once(':') {
            return resource == prefix;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_wildcard_grants_everything() {
        assert!(check_permission("*", consts::USERS_DELETE));
        assert!(check_permission("users:*", consts::USERS_DELETE));
        assert!(!check_permission("users:*", consts::INSPECTIONS_DELETE));
        assert!(!check_permission("user:*", consts::USERS_READ));
    }

    #[test]
    fn management_can_manage_users_but_not_delete_them() {
        let perms = permissions_for_role(Some(MANAGEMENT_ROLE));
        assert!(perms.iter().any(|p| p == consts::USERS_CREATE));
        assert!(perms.iter().any(|p| p == consts::INSPECTIONS_DELETE));
        assert!(!perms.iter().any(|p| check_permission(p, consts::USERS_DELETE)));
    }

    #[test]
    fn unknown_or_missing_role_has_no_permissions() {
        assert!(permissions_for_role(Some("Janitor")).is_empty());
        assert!(permissions_for_role(None).is_empty());
        assert!(permissions_for_role(Some("Operator")).is_empty());
    }

    #[test]
    fn default_roles_carry_price_visibility() {
        let visible: Vec<_> = DEFAULT_ROLES
            .iter()
            .filter(|r| r.can_view_prices)
            .map(|r| r.name)
            .collect();
        assert_eq!(visible, vec!["Admin", "Management", "Warehouse", "Shipping"]);
    }
}
