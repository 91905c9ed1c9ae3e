//! Target ruleset: batch admission, mutation and deletion checks.
//!
//! # Responsibility
//! - Enforce per-mission target capacity and name uniqueness for new batches.
//! - Compute the merged target for a mutation request.
//! - Reject edits and deletion of completed targets.
//!
//! # Invariants
//! - `existing + incoming` never exceeds [`MAX_TARGETS_PER_MISSION`].
//! - Name comparison is exact and case-sensitive.
//! - A mutation never both completes a target and rewrites its notes.

use crate::model::completion::AlreadyCompleted;
use crate::model::mission::{Target, TargetDraft, TargetId, TargetUpdate, MAX_TARGETS_PER_MISSION};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Minimum target name length, counted in characters after trimming.
pub const MIN_TARGET_NAME_CHARS: usize = 2;

/// Rule violation raised by the target ruleset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRuleError {
    /// Batch would push the mission past its target limit.
    CapacityExceeded {
        existing: usize,
        incoming: usize,
        max: usize,
    },
    /// Name already used by an existing or sibling incoming target.
    DuplicateName(String),
    /// Field-level input that the transport should already have rejected.
    InvalidField { field: &'static str, reason: String },
    /// Target is completed; its notes and existence are frozen.
    TargetFrozen(TargetId),
    /// Request completes the target and edits notes in one go.
    InvalidMutation,
}

impl Display for TargetRuleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CapacityExceeded {
                existing,
                incoming,
                max,
            } => write!(
                f,
                "mission holds {existing} targets; adding {incoming} exceeds the limit of {max}"
            ),
            Self::DuplicateName(name) => {
                write!(f, "target name already used in mission: `{name}`")
            }
            Self::InvalidField { field, reason } => write!(f, "invalid `{field}`: {reason}"),
            Self::TargetFrozen(id) => write!(f, "target is completed and frozen: {id}"),
            Self::InvalidMutation => write!(
                f,
                "cannot update notes in the same request that completes the target"
            ),
        }
    }
}

impl Error for TargetRuleError {}

/// Validates a batch of new targets against the mission's current targets.
///
/// Checks run in order: capacity, then per incoming target its fields,
/// collisions with existing names, and collisions within the batch. The
/// first violation wins.
pub fn validate_new_batch(
    existing: &[Target],
    incoming: &[TargetDraft],
) -> Result<(), TargetRuleError> {
    if existing.len() + incoming.len() > MAX_TARGETS_PER_MISSION {
        return Err(TargetRuleError::CapacityExceeded {
            existing: existing.len(),
            incoming: incoming.len(),
            max: MAX_TARGETS_PER_MISSION,
        });
    }

    let existing_names: HashSet<&str> = existing.iter().map(|t| t.name.as_str()).collect();
    let mut batch_names: HashSet<&str> = HashSet::with_capacity(incoming.len());
    for draft in incoming {
        validate_draft_fields(draft)?;
        if existing_names.contains(draft.name.as_str()) || !batch_names.insert(draft.name.as_str())
        {
            return Err(TargetRuleError::DuplicateName(draft.name.clone()));
        }
    }

    Ok(())
}

/// Returns the target as it should look after applying `request`.
///
/// The input target is left untouched; callers persist the returned value.
pub fn validate_mutation(
    target: &Target,
    request: &TargetUpdate,
) -> Result<Target, TargetRuleError> {
    if target.is_completed() {
        return Err(TargetRuleError::TargetFrozen(target.id));
    }
    if request.complete && request.notes.is_some() {
        return Err(TargetRuleError::InvalidMutation);
    }

    let mut merged = target.clone();
    if let Some(notes) = &request.notes {
        merged.notes = notes.clone();
    }
    if request.complete {
        merged.state = merged
            .state
            .complete()
            .map_err(|AlreadyCompleted| TargetRuleError::TargetFrozen(target.id))?;
    }
    Ok(merged)
}

/// Rejects deletion of completed targets.
pub fn validate_deletion(target: &Target) -> Result<(), TargetRuleError> {
    if target.is_completed() {
        return Err(TargetRuleError::TargetFrozen(target.id));
    }
    Ok(())
}

fn validate_draft_fields(draft: &TargetDraft) -> Result<(), TargetRuleError> {
    if draft.name.trim().chars().count() < MIN_TARGET_NAME_CHARS {
        return Err(TargetRuleError::InvalidField {
            field: "name",
            reason: format!("must be at least {MIN_TARGET_NAME_CHARS} characters"),
        });
    }
    if draft.country.trim().is_empty() {
        return Err(TargetRuleError::InvalidField {
            field: "country",
            reason: "must not be blank".to_string(),
        });
    }
    Ok(())
}
