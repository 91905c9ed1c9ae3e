//! Pure validation and transition rules.
//!
//! Nothing in this module performs I/O; every function operates over an
//! in-memory view of a mission and returns either the next state or a rule
//! violation.

pub mod target_rules;
