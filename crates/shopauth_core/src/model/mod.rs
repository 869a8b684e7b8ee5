//! Domain model for account records.
//!
//! # Responsibility
//! - Define the canonical user shape shared by both storage backends.
//!
//! # Invariants
//! - Every account is identified by a stable `UserId`.
//! - Records are read-only after creation; there is no profile-edit or
//!   account-deletion use case.

pub mod user;
