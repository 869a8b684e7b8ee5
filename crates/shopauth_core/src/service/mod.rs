//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store and hasher calls into registration/login use cases.
//! - Keep console/HTTP entry points decoupled from storage details.

pub mod credential_service;
