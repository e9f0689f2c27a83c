//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use proofroom_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
///
/// Contains the password hash and verification token -- NEVER serialize this
/// to API responses directly. Use [`UserResponse`] for external-facing
/// output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub password_hash: String,
    /// `"photographer"` or `"client"`; immutable after creation.
    pub role: String,
    pub display_name: String,
    pub phone: String,
    pub email_verified: bool,
    pub verification_token: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe user representation for API responses (no secrets).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub email: String,
    pub role: String,
    pub display_name: String,
    pub phone: String,
    pub email_verified: bool,
    pub created_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            display_name: user.display_name,
            phone: user.phone,
            email_verified: user.email_verified,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub display_name: String,
    pub phone: String,
    /// SHA-256 hex digest of the emailed verification token.
    pub verification_token: String,
}

/// DTO for updating profile fields. Role and email are immutable.
#[derive(Debug, Deserialize)]
pub struct UpdateProfile {
    pub display_name: Option<String>,
    pub phone: Option<String>,
}
