//! Password hashing and verification.
//!
//! # Responsibility
//! - Derive salted PBKDF2-HMAC-SHA256 hashes in a self-describing encoding.
//! - Verify candidate passwords against stored encodings without leaking
//!   timing information.
//!
//! # Invariants
//! - Stored format is `pbkdf2$<iterations>$<salt-hex>$<derived-key-hex>`.
//! - Malformed stored encodings are a verification failure (`false`),
//!   never a panic or error.
//! - The iteration count is a positive integer by construction.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use std::num::NonZeroU32;

const SCHEME: &str = "pbkdf2";
const SALT_BYTES: usize = 16;
const KEY_BYTES: usize = 32;

/// Default PBKDF2 iteration count for newly created hashes.
pub const DEFAULT_ITERATIONS: u32 = 120_000;

// Compile-time checked non-zero form of the default.
const DEFAULT_ITERATIONS_NZ: NonZeroU32 = match NonZeroU32::new(DEFAULT_ITERATIONS) {
    Some(n) => n,
    None => panic!("DEFAULT_ITERATIONS must be positive"),
};

/// Stateless hasher for account passwords.
///
/// The iteration count only affects newly created hashes; verification reads
/// the count back from the stored encoding, so old hashes keep verifying
/// after the default is raised.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: NonZeroU32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher {
    /// Creates a hasher using [`DEFAULT_ITERATIONS`].
    pub fn new() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS_NZ,
        }
    }

    /// Creates a hasher with an explicit iteration count.
    ///
    /// Lower counts are intended for tests; production callers should keep
    /// the default.
    pub fn with_iterations(iterations: NonZeroU32) -> Self {
        Self { iterations }
    }

    /// Hashes `password` with a fresh random 16-byte salt.
    ///
    /// Two calls with the same password return different encodings.
    pub fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_BYTES];
        OsRng.fill_bytes(&mut salt);

        let mut derived = [0u8; KEY_BYTES];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            password.as_bytes(),
            &salt,
            self.iterations.get(),
            &mut derived,
        );

        format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            hex::encode(salt),
            hex::encode(derived)
        )
    }

    /// Verifies `password` against a stored encoding.
    ///
    /// Returns `false` for unknown scheme tags, non-integer or zero
    /// iteration counts, non-hex fields, or a wrong field count. The stored
    /// and recomputed keys are compared in constant time.
    pub fn verify(&self, password: &str, encoded: &str) -> bool {
        let mut fields = encoded.split('$');
        let (Some(scheme), Some(iterations), Some(salt), Some(key), None) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) else {
            return false;
        };

        if scheme != SCHEME {
            return false;
        }
        let Ok(iterations) = iterations.parse::<u32>() else {
            return false;
        };
        if iterations == 0 {
            return false;
        }
        let Ok(salt) = hex::decode(salt) else {
            return false;
        };
        let Ok(expected) = hex::decode(key) else {
            return false;
        };
        if expected.is_empty() {
            return false;
        }

        let mut derived = vec![0u8; expected.len()];
        pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut derived);

        constant_time_eq(&derived, &expected)
    }
}

/// Constant-time byte comparison to prevent timing attacks.
///
/// Never short-circuits on the first differing byte; the length check alone
/// is observable, which is acceptable because key lengths are not secret.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::{constant_time_eq, PasswordHasher, DEFAULT_ITERATIONS};
    use std::num::NonZeroU32;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::with_iterations(NonZeroU32::new(1_000).unwrap())
    }

    #[test]
    fn hash_then_verify_roundtrip() {
        let hasher = fast_hasher();
        let encoded = hasher.hash("secret1");
        assert!(hasher.verify("secret1", &encoded));
    }

    #[test]
    fn wrong_password_fails() {
        let hasher = fast_hasher();
        let encoded = hasher.hash("secret1");
        assert!(!hasher.verify("secret2", &encoded));
        assert!(!hasher.verify("", &encoded));
    }

    #[test]
    fn same_password_hashes_differently() {
        let hasher = fast_hasher();
        let first = hasher.hash("secret1");
        let second = hasher.hash("secret1");
        assert_ne!(first, second);
        assert!(hasher.verify("secret1", &first));
        assert!(hasher.verify("secret1", &second));
    }

    #[test]
    fn encoding_is_self_describing() {
        let hasher = PasswordHasher::new();
        let encoded = hasher.hash("secret1");
        let fields: Vec<&str> = encoded.split('$').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], "pbkdf2");
        assert_eq!(fields[1], DEFAULT_ITERATIONS.to_string());
        assert_eq!(fields[2].len(), 32);
        assert_eq!(fields[3].len(), 64);
    }

    #[test]
    fn verify_honors_stored_iteration_count() {
        // A hash created with a non-default count must verify under a hasher
        // configured differently.
        let encoded = fast_hasher().hash("secret1");
        assert!(PasswordHasher::new().verify("secret1", &encoded));
    }

    #[test]
    fn malformed_encodings_fail_closed() {
        let hasher = fast_hasher();
        let good = hasher.hash("secret1");

        for bad in [
            "",
            "pbkdf2",
            "pbkdf2$1000",
            "pbkdf2$1000$aabb",
            "pbkdf2$1000$aabb$ccdd$extra",
            "scrypt$1000$aabb$ccdd",
            "pbkdf2$zero$aabb$ccdd",
            "pbkdf2$0$aabb$ccdd",
            "pbkdf2$-5$aabb$ccdd",
            "pbkdf2$1000$nothex$ccdd",
            "pbkdf2$1000$aabb$nothex",
            "pbkdf2$1000$aabb$",
            &good[..good.len() - 3],
        ] {
            assert!(!hasher.verify("secret1", bad), "accepted `{bad}`");
        }
    }

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer"));
        assert!(constant_time_eq(b"", b""));
    }
}
