//! User domain model.
//!
//! # Invariants
//! - `id` is assigned by the store on creation and never changes.
//! - `password_hash` is never empty and always self-describing (scheme,
//!   iteration count and salt are embedded in the encoded string).
//! - Exactly one user exists per case-insensitive login key.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for a stored account.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type UserId = Uuid;

/// Canonical account record.
///
/// Both storage backends hydrate into this one shape; only the uniqueness
/// key differs (username for the file backend, email for the table backend).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable global ID assigned by the store at insert time.
    pub id: UserId,
    /// Display/login handle.
    pub name: String,
    /// Normalized lowercase email. Optional for the file backend.
    pub email: Option<String>,
    /// Encoded password hash. Never the raw password.
    pub password_hash: String,
    /// Creation timestamp in Unix epoch milliseconds, store-assigned.
    pub created_at: i64,
}

impl User {
    /// Returns the outward-facing projection of this record.
    pub fn to_view(&self) -> UserView {
        UserView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

/// Outward-facing account projection.
///
/// This is the only user shape entry points are expected to render or
/// serialize; it deliberately has no `password_hash` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub created_at: i64,
}

/// Insert candidate handed to a `UserStore`.
///
/// `key` is the variant's uniqueness key. The store assigns `id` and
/// `created_at` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Login key: username (file backend) or email (table backend).
    pub key: String,
    /// Display name, when the login key is not itself the display handle.
    pub name: Option<String>,
    /// Contact email, when it is not itself the login key.
    pub email: Option<String>,
    /// Already-encoded password hash.
    pub password_hash: String,
}

/// Current Unix epoch in milliseconds.
pub(crate) fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
