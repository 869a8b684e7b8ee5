//! User store abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage contract shared by both account backends.
//! - Isolate file and SQLite persistence details from the credential
//!   service.
//!
//! # Invariants
//! - Store implementations enforce case-insensitive key uniqueness
//!   atomically with respect to concurrent inserts.
//! - Store APIs return semantic errors (`DuplicateKey`) in addition to
//!   transport errors.

pub mod json_store;
pub mod sqlite_store;
pub mod user_store;
