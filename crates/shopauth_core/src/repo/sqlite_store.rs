//! SQLite-backed user store.
//!
//! # Responsibility
//! - Persist account records as single rows in the `users` table.
//! - Surface key collisions from the UNIQUE constraint instead of a
//!   separate read, so concurrent inserts cannot race past the check.
//!
//! # Invariants
//! - The uniqueness key is the email, compared case-insensitively
//!   (`COLLATE NOCASE` on the column).
//! - Emails are normalized to lowercase before persistence.

use crate::model::user::{epoch_ms, NewUser, User, UserId};
use crate::repo::user_store::{LoginKeyKind, StoreError, StoreResult, UserStore};
use log::info;
use parking_lot::Mutex;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    password_hash,
    created_at
FROM users";

/// Table-backed user store keyed by email.
///
/// The connection is expected to come from `db::open_db` /
/// `db::open_db_in_memory`, which apply migrations before handing it out.
pub struct SqliteUserStore {
    // rusqlite connections are not Sync; the mutex makes the store shareable
    // across request handlers.
    conn: Mutex<Connection>,
}

impl SqliteUserStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl UserStore for SqliteUserStore {
    fn key_kind(&self) -> LoginKeyKind {
        LoginKeyKind::Email
    }

    fn find_by_key(&self, key: &str) -> StoreResult<Option<User>> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            &format!("{USER_SELECT_SQL} WHERE email = ?1 COLLATE NOCASE"),
            params![key],
            row_to_parts,
        );

        match row {
            Ok(parts) => Ok(Some(parts_to_user(parts)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            &format!("{USER_SELECT_SQL} WHERE id = ?1"),
            params![id.to_string()],
            row_to_parts,
        );

        match row {
            Ok(parts) => Ok(Some(parts_to_user(parts)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn insert(&self, candidate: NewUser) -> StoreResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            // The email is the login key; the display name travels separately.
            name: candidate.name.unwrap_or_else(|| candidate.key.clone()),
            email: Some(candidate.key.to_lowercase()),
            password_hash: candidate.password_hash,
            created_at: epoch_ms(),
        };

        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO users (id, name, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.to_string(),
                user.name,
                user.email,
                user.password_hash,
                user.created_at,
            ],
        );

        match result {
            Ok(_) => {
                info!(
                    "event=user_insert module=repo backend=sqlite status=ok user_id={}",
                    user.id
                );
                Ok(user)
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateKey(candidate.key))
            }
            Err(err) => Err(err.into()),
        }
    }
}

type UserParts = (String, String, String, String, i64);

fn row_to_parts(row: &Row<'_>) -> rusqlite::Result<UserParts> {
    Ok((
        row.get("id")?,
        row.get("name")?,
        row.get("email")?,
        row.get("password_hash")?,
        row.get("created_at")?,
    ))
}

fn parts_to_user((id, name, email, password_hash, created_at): UserParts) -> StoreResult<User> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| StoreError::Corrupt(format!("invalid uuid value `{id}` in users.id")))?;
    Ok(User {
        id,
        name,
        email: Some(email),
        password_hash,
        created_at,
    })
}
