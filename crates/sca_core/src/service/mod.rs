//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store reads, ruleset checks and conditional writes into
//!   use-case level operations.
//! - Translate store outcomes into stable domain error kinds.
//!
//! # Invariants
//! - Services hold no lock across requests; cross-request safety comes
//!   from the store's conditional writes.
//! - No operation retries internally; the first failure is surfaced.

pub mod assignment;
pub mod cat_service;
pub mod error;
pub mod mission_service;
