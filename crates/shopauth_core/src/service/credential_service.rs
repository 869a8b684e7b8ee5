//! Registration and login use-case service.
//!
//! # Responsibility
//! - Validate raw credential input in a fixed order.
//! - Delegate persistence to a `UserStore` and hashing to `PasswordHasher`.
//!
//! # Invariants
//! - A registration that fails validation never touches the store.
//! - Login reports one indistinguishable `InvalidCredentials` outcome for
//!   unknown users and wrong passwords.

use crate::model::user::{NewUser, User};
use crate::password::PasswordHasher;
use crate::repo::user_store::{LoginKeyKind, StoreError, UserStore};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MIN_PASSWORD_CHARS: usize = 6;

/// Raw registration input, already trimmed by the entry point.
///
/// `key` is the login handle: the username for the file-backed store, the
/// email for the table-backed store. The store variant decides which of
/// `name`/`email` it additionally requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub key: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

/// Raw login input, already trimmed by the entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub key: String,
    pub password: String,
}

/// Expected registration outcomes, surfaced as data rather than panics.
#[derive(Debug)]
pub enum RegisterError {
    MissingFields,
    WeakPassword,
    InvalidEmail,
    DuplicateKey,
    /// Fatal-class storage failure; render as a generic "try again".
    Store(StoreError),
}

impl Display for RegisterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields => write!(f, "all fields are required"),
            Self::WeakPassword => {
                write!(f, "password must be at least {MIN_PASSWORD_CHARS} characters")
            }
            Self::InvalidEmail => write!(f, "email address is not valid"),
            Self::DuplicateKey => write!(f, "an account with this login already exists"),
            Self::Store(_) => write!(f, "account storage is unavailable, try again"),
        }
    }
}

impl Error for RegisterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

/// Expected login outcomes.
#[derive(Debug)]
pub enum LoginError {
    /// Unknown user or wrong password; deliberately not distinguished.
    InvalidCredentials,
    /// Fatal-class storage failure; render as a generic "try again".
    Store(StoreError),
}

impl Display for LoginError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid login or password"),
            Self::Store(_) => write!(f, "account storage is unavailable, try again"),
        }
    }
}

impl Error for LoginError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidCredentials => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for LoginError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Use-case service orchestrating registration and login.
///
/// Written once over the `UserStore` contract; both entry points construct
/// it with their own backend.
pub struct CredentialService<S: UserStore> {
    store: S,
    hasher: PasswordHasher,
}

impl<S: UserStore> CredentialService<S> {
    /// Creates a service with the default hashing parameters.
    pub fn new(store: S) -> Self {
        Self::with_hasher(store, PasswordHasher::new())
    }

    /// Creates a service with an explicit hasher (tests lower the iteration
    /// count through this).
    pub fn with_hasher(store: S, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    /// Read access to the backing store, for entry-point lookups such as
    /// resolving a session's user id.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registers a new account.
    ///
    /// Validation order, first failing rule wins: required fields present,
    /// password length, email shape, key uniqueness. The store is only
    /// touched after all input validation has passed.
    pub fn register(&self, request: &RegisterRequest) -> Result<User, RegisterError> {
        let kind = self.store.key_kind();

        if request.key.is_empty() || request.password.is_empty() || !has_required_field(request, kind) {
            return Err(RegisterError::MissingFields);
        }

        if request.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(RegisterError::WeakPassword);
        }

        let email_candidate = match kind {
            LoginKeyKind::Username => request.email.as_deref(),
            LoginKeyKind::Email => Some(request.key.as_str()),
        };
        if let Some(email) = email_candidate {
            if !looks_like_email(email) {
                return Err(RegisterError::InvalidEmail);
            }
        }

        let candidate = NewUser {
            key: request.key.clone(),
            name: request.name.clone(),
            email: request.email.clone(),
            password_hash: self.hasher.hash(&request.password),
        };

        // Uniqueness is enforced inside the store so a concurrent insert
        // cannot slip between a separate check and the write.
        match self.store.insert(candidate) {
            Ok(user) => {
                info!(
                    "event=register module=service status=ok key_kind={kind:?} user_id={}",
                    user.id
                );
                Ok(user)
            }
            Err(StoreError::DuplicateKey(_)) => Err(RegisterError::DuplicateKey),
            Err(err) => {
                warn!("event=register module=service status=error error={err}");
                Err(RegisterError::Store(err))
            }
        }
    }

    /// Authenticates an account by login key and password.
    pub fn login(&self, request: &LoginRequest) -> Result<User, LoginError> {
        match self.store.find_by_key(&request.key)? {
            Some(user) if self.hasher.verify(&request.password, &user.password_hash) => {
                info!(
                    "event=login module=service status=ok user_id={}",
                    user.id
                );
                Ok(user)
            }
            Some(_) => Err(LoginError::InvalidCredentials),
            None => {
                // Burn the same derivation work as the wrong-password path so
                // unknown users are not detectable through response timing.
                let _ = self.hasher.hash(&request.password);
                Err(LoginError::InvalidCredentials)
            }
        }
    }
}

fn has_required_field(request: &RegisterRequest, kind: LoginKeyKind) -> bool {
    let extra = match kind {
        LoginKeyKind::Username => request.email.as_deref(),
        LoginKeyKind::Email => request.name.as_deref(),
    };
    extra.is_some_and(|value| !value.is_empty())
}

fn looks_like_email(value: &str) -> bool {
    value.contains('@') && value.contains('.')
}

#[cfg(test)]
mod tests {
    use super::looks_like_email;

    #[test]
    fn email_shape_check() {
        assert!(looks_like_email("bob@x.com"));
        assert!(!looks_like_email("bob-at-x.com"));
        assert!(!looks_like_email("bob@xcom"));
        assert!(!looks_like_email(""));
    }
}
