//! Core credential logic for the shopauth demo.
//! This crate is the single source of truth for account invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod password;
pub mod repo;
pub mod service;
pub mod session;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::user::{NewUser, User, UserId, UserView};
pub use password::PasswordHasher;
pub use repo::json_store::JsonFileUserStore;
pub use repo::sqlite_store::SqliteUserStore;
pub use repo::user_store::{LoginKeyKind, StoreError, StoreResult, UserStore};
pub use service::credential_service::{
    CredentialService, LoginError, LoginRequest, RegisterError, RegisterRequest,
};
pub use session::SessionRegistry;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
