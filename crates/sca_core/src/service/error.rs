//! Domain error kinds shared by the mission lifecycle and assignment paths.

use crate::model::cat::CatId;
use crate::model::mission::{MissionId, TargetId};
use crate::repo::RepoError;
use crate::rules::target_rules::TargetRuleError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Coarse response class for a service error.
///
/// Transports map each class to one response family; `code()` tells the
/// specific kind within a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Conflict,
    Invalid,
    Unavailable,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Invalid => "invalid",
            Self::Unavailable => "unavailable",
        }
    }
}

/// Entity named by a not-found error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Cat(CatId),
    Mission(MissionId),
    Target(TargetId),
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cat(id) => write!(f, "cat {id}"),
            Self::Mission(id) => write!(f, "mission {id}"),
            Self::Target(id) => write!(f, "target {id}"),
        }
    }
}

/// Errors from mission lifecycle and assignment operations.
#[derive(Debug)]
pub enum MissionServiceError {
    NotFound(EntityRef),
    /// Mission is completed; its targets and assignment are immutable.
    MissionCompleted(MissionId),
    /// Completion was requested for a mission that is already completed.
    MissionAlreadyCompleted(MissionId),
    MissionHasAssignedCat {
        mission_id: MissionId,
        cat_id: CatId,
    },
    TargetNotInMission {
        mission_id: MissionId,
        target_id: TargetId,
    },
    TargetFrozen(TargetId),
    InvalidMutation,
    CapacityExceeded {
        existing: usize,
        incoming: usize,
        max: usize,
    },
    DuplicateName(String),
    InvalidField {
        field: &'static str,
        reason: String,
    },
    /// Conditional assignment affected no rows: the mission was assigned,
    /// completed or deleted concurrently, or the cat is active elsewhere.
    AssignmentConflict {
        mission_id: MissionId,
        cat_id: CatId,
    },
    /// A conditional write affected no rows and re-reading found no named
    /// cause. Not expected in practice: every write precondition maps to
    /// one of the kinds above. Treat like `AssignmentConflict`: re-fetch
    /// the mission and decide.
    StaleMission(MissionId),
    /// Store/infrastructure failure.
    Repo(RepoError),
}

impl MissionServiceError {
    /// Stable machine-readable identifier.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::MissionCompleted(_) => "mission_completed",
            Self::MissionAlreadyCompleted(_) => "mission_already_completed",
            Self::MissionHasAssignedCat { .. } => "mission_has_assigned_cat",
            Self::TargetNotInMission { .. } => "target_not_in_mission",
            Self::TargetFrozen(_) => "target_frozen",
            Self::InvalidMutation => "invalid_mutation",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::DuplicateName(_) => "duplicate_name",
            Self::InvalidField { .. } => "invalid_field",
            Self::AssignmentConflict { .. } => "assignment_conflict",
            Self::StaleMission(_) => "stale_mission",
            Self::Repo(_) => "store_unavailable",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::MissionCompleted(_)
            | Self::MissionAlreadyCompleted(_)
            | Self::MissionHasAssignedCat { .. }
            | Self::TargetFrozen(_)
            | Self::AssignmentConflict { .. }
            | Self::StaleMission(_) => ErrorCategory::Conflict,
            Self::TargetNotInMission { .. }
            | Self::InvalidMutation
            | Self::CapacityExceeded { .. }
            | Self::DuplicateName(_)
            | Self::InvalidField { .. } => ErrorCategory::Invalid,
            Self::Repo(_) => ErrorCategory::Unavailable,
        }
    }
}

impl Display for MissionServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::MissionCompleted(id) => write!(f, "mission is completed: {id}"),
            Self::MissionAlreadyCompleted(id) => write!(f, "mission already completed: {id}"),
            Self::MissionHasAssignedCat { mission_id, cat_id } => write!(
                f,
                "mission {mission_id} cannot be deleted while assigned to cat {cat_id}"
            ),
            Self::TargetNotInMission {
                mission_id,
                target_id,
            } => write!(f, "target {target_id} does not belong to mission {mission_id}"),
            Self::TargetFrozen(id) => write!(f, "target is completed and frozen: {id}"),
            Self::InvalidMutation => write!(
                f,
                "cannot update notes in the same request that completes the target"
            ),
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
            Self::AssignmentConflict { mission_id, cat_id } => write!(
                f,
                "cannot assign cat {cat_id} to mission {mission_id}: mission not assignable or cat already on an active mission"
            ),
            Self::StaleMission(id) => {
                write!(f, "mission changed concurrently, re-fetch and retry: {id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MissionServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for MissionServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<TargetRuleError> for MissionServiceError {
    fn from(value: TargetRuleError) -> Self {
        match value {
            TargetRuleError::CapacityExceeded {
                existing,
                incoming,
                max,
            } => Self::CapacityExceeded {
                existing,
                incoming,
                max,
            },
            TargetRuleError::DuplicateName(name) => Self::DuplicateName(name),
            TargetRuleError::InvalidField { field, reason } => Self::InvalidField { field, reason },
            TargetRuleError::TargetFrozen(id) => Self::TargetFrozen(id),
            TargetRuleError::InvalidMutation => Self::InvalidMutation,
        }
    }
}
