/*!
 * # Permissions Module
 *
 * Permission strings gate the few actions that are restricted beyond
 * "any signed-in user". They take the form `resource:action`.
 */

/// Common permission string constants for compile-time safety
pub mod consts {
    // Users
    pub const USERS_READ: &str = "users:read";
    pub const USERS_CREATE: &str = "users:create";
    pub const USERS_UPDATE: &str = "users:update";
    pub const USERS_DELETE: &str = "users:delete";

    // Quality
    pub const INSPECTIONS_DELETE: &str = "inspections:delete";

    // Audit trail
    pub const AUDIT_READ: &str = "audit:read";

    /// Grants everything
    pub const ALL: &str = "*";
}
