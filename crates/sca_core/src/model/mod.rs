//! Dispatch domain model: cats, missions and their targets.
//!
//! # Responsibility
//! - Define canonical data structures used by the consistency engine.
//! - Model one-way completion as an explicit two-state machine.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID that is never reused.
//! - A mission exclusively owns its targets.
//! - Completion never moves backward for missions or targets.

pub mod cat;
pub mod completion;
pub mod mission;
