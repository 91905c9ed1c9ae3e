//! Mission and target models.
//!
//! # Responsibility
//! - Define the mission aggregate and its owned targets.
//! - Define caller-facing inputs for target creation and mutation.
//!
//! # Invariants
//! - `targets` holds between 0 and [`MAX_TARGETS_PER_MISSION`] entries.
//! - Target names are unique within one mission (exact, case-sensitive).
//! - A completed mission's `assigned_cat` and `targets` never change.

use super::cat::CatId;
use super::completion::Completion;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type MissionId = Uuid;
pub type TargetId = Uuid;

/// Upper bound on targets a mission may hold over its lifetime.
pub const MAX_TARGETS_PER_MISSION: usize = 3;

/// Mission aggregate with its targets in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    pub assigned_cat: Option<CatId>,
    pub state: Completion,
    pub targets: Vec<Target>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Mission {
    pub fn is_completed(&self) -> bool {
        self.state.is_completed()
    }

    pub fn target(&self, target_id: TargetId) -> Option<&Target> {
        self.targets.iter().find(|target| target.id == target_id)
    }
}

/// Objective owned by exactly one mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub mission_id: MissionId,
    pub name: String,
    pub country: String,
    /// Free text; frozen once the target completes.
    pub notes: String,
    pub state: Completion,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Target {
    pub fn is_completed(&self) -> bool {
        self.state.is_completed()
    }
}

/// Caller input for one new target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDraft {
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub notes: String,
}

impl TargetDraft {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            notes: String::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Caller input for one target mutation.
///
/// `notes: None` leaves notes untouched. `complete: false` leaves the
/// completion state untouched; there is no way to reopen a target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetUpdate {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub complete: bool,
}

impl TargetUpdate {
    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
            complete: false,
        }
    }

    pub fn complete() -> Self {
        Self {
            notes: None,
            complete: true,
        }
    }
}
