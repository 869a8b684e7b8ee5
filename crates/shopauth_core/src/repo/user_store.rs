//! Storage contract for account records.

use crate::db::DbError;
use crate::model::user::{NewUser, User, UserId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence error for account storage operations.
///
/// `DuplicateKey` is the only expected, recoverable variant; the rest are
/// fatal-class IO/transport failures that entry points surface as a generic
/// "try again" outcome.
#[derive(Debug)]
pub enum StoreError {
    /// An existing record already owns this case-insensitive login key.
    DuplicateKey(String),
    Db(DbError),
    Io(std::io::Error),
    /// The backing store held data that no longer parses as account records.
    Corrupt(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateKey(key) => write!(f, "account already exists: {key}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Corrupt(message) => write!(f, "corrupt user store: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DuplicateKey(_) => None,
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Corrupt(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Which input field a store variant treats as the login key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginKeyKind {
    /// Key is the username; a separate contact email is required.
    Username,
    /// Key is the email; a separate display name is required.
    Email,
}

/// Storage contract shared by the file-backed and table-backed variants.
///
/// Lookups are case-insensitive on the variant's uniqueness key and report
/// absence as `Ok(None)`, never as an error. `insert` assigns the id and
/// creation timestamp, and its uniqueness check is atomic with respect to
/// concurrent callers: no two inserts with the same case-insensitive key
/// may both succeed.
pub trait UserStore {
    fn key_kind(&self) -> LoginKeyKind;
    fn find_by_key(&self, key: &str) -> StoreResult<Option<User>>;
    fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>>;
    fn insert(&self, candidate: NewUser) -> StoreResult<User>;
}
