//! Well-known role name constants.
//!
//! These must match the CHECK constraint on `users.role` in
//! `20260301000001_create_users.sql`. Roles are fixed at registration and
//! never change afterwards.

pub const ROLE_PHOTOGRAPHER: &str = "photographer";
pub const ROLE_CLIENT: &str = "client";

/// All valid role names, in the order they appear in registration forms.
pub const VALID_ROLES: &[&str] = &[ROLE_PHOTOGRAPHER, ROLE_CLIENT];

/// Check whether `role` is one of the known role names.
pub fn is_valid_role(role: &str) -> bool {
    VALID_ROLES.contains(&role)
}
