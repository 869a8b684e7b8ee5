//! JSON-file-backed user store.
//!
//! # Responsibility
//! - Persist account records as a JSON array in a single local file.
//! - Serialize check-then-write so concurrent inserts cannot both claim the
//!   same key.
//!
//! # Invariants
//! - Every mutation rewrites the whole file via write-to-temp-then-rename,
//!   so a crash mid-write never leaves a torn or empty store behind.
//! - The uniqueness key is the username, compared case-insensitively.

use crate::model::user::{epoch_ms, NewUser, User, UserId};
use crate::repo::user_store::{LoginKeyKind, StoreError, StoreResult, UserStore};
use log::info;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// On-disk record shape.
///
/// `id` and `created_at` are persisted alongside the original three-field
/// payload so identities stay stable across process restarts.
#[derive(Debug, Serialize, Deserialize)]
struct StoredUser {
    id: UserId,
    username: String,
    email: Option<String>,
    password_hash: String,
    created_at: i64,
}

impl From<StoredUser> for User {
    fn from(record: StoredUser) -> Self {
        Self {
            id: record.id,
            name: record.username,
            email: record.email,
            password_hash: record.password_hash,
            created_at: record.created_at,
        }
    }
}

impl From<&User> for StoredUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: user.created_at,
        }
    }
}

/// File-backed user store keyed by username.
pub struct JsonFileUserStore {
    path: PathBuf,
    // Serializes the read-full/modify/write-full cycle across callers.
    lock: Mutex<()>,
}

impl JsonFileUserStore {
    /// Opens the store at `path`, creating an empty one when the file does
    /// not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self {
            path: path.into(),
            lock: Mutex::new(()),
        };
        if !store.path.exists() {
            store.save(&[])?;
        }
        Ok(store)
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StoreResult<Vec<User>> {
        let raw = fs::read_to_string(&self.path)?;
        let records: Vec<StoredUser> = serde_json::from_str(&raw)
            .map_err(|err| StoreError::Corrupt(format!("{}: {err}", self.path.display())))?;
        Ok(records.into_iter().map(User::from).collect())
    }

    fn save(&self, users: &[User]) -> StoreResult<()> {
        let records: Vec<StoredUser> = users.iter().map(StoredUser::from).collect();
        let body = serde_json::to_vec_pretty(&records)
            .map_err(|err| StoreError::Corrupt(err.to_string()))?;

        // Write the new content next to the store and swap it in with a
        // rename, which is atomic at the file level.
        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(&body)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut os = self.path.clone().into_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    }
}

impl UserStore for JsonFileUserStore {
    fn key_kind(&self) -> LoginKeyKind {
        LoginKeyKind::Username
    }

    fn find_by_key(&self, key: &str) -> StoreResult<Option<User>> {
        let _guard = self.lock.lock();
        let users = self.load()?;
        Ok(users
            .into_iter()
            .find(|user| user.name.eq_ignore_ascii_case(key)))
    }

    fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let _guard = self.lock.lock();
        let users = self.load()?;
        Ok(users.into_iter().find(|user| user.id == id))
    }

    fn insert(&self, candidate: NewUser) -> StoreResult<User> {
        let _guard = self.lock.lock();
        let mut users = self.load()?;

        if users
            .iter()
            .any(|user| user.name.eq_ignore_ascii_case(&candidate.key))
        {
            return Err(StoreError::DuplicateKey(candidate.key));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: candidate.key,
            email: candidate.email.map(|email| email.to_lowercase()),
            password_hash: candidate.password_hash,
            created_at: epoch_ms(),
        };
        users.push(user.clone());
        self.save(&users)?;

        info!(
            "event=user_insert module=repo backend=json status=ok user_id={}",
            user.id
        );
        Ok(user)
    }
}
