//! In-process session registry for the network entry point.
//!
//! # Responsibility
//! - Map opaque session tokens to authenticated user ids.
//!
//! # Invariants
//! - Tokens carry 256 bits of OS-CSPRNG entropy, hex-encoded (URL-safe).
//! - State lives only in process memory; losing it on restart is expected
//!   and not an invariant violation.

use crate::model::user::UserId;
use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;

/// Token byte length before hex encoding (32 bytes = 64 hex chars).
const TOKEN_BYTES: usize = 32;

/// Token-to-user map shared by concurrent request handlers.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, UserId>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session for `user_id` and returns its fresh token.
    ///
    /// The token is only handed to the caller; it is never logged.
    pub fn create(&self, user_id: UserId) -> String {
        let token = generate_token();
        self.sessions.lock().insert(token.clone(), user_id);
        token
    }

    /// Resolves a token to its user id, if the session is still alive.
    pub fn resolve(&self, token: &str) -> Option<UserId> {
        self.sessions.lock().get(token).copied()
    }

    /// Removes a session. Destroying an unknown token is a no-op.
    pub fn destroy(&self, token: &str) {
        self.sessions.lock().remove(token);
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
