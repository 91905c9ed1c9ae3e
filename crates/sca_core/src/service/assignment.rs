//! Assignment coordinator: binds a cat to a mission.
//!
//! # Responsibility
//! - Bind a cat to a mission through one atomic conditional write.
//!
//! # Invariants
//! - The write lands only if, at write time, the mission exists, is not
//!   completed, has no assigned cat, and no other active mission holds the
//!   cat. Nothing is checked in Rust and then written unconditionally.
//! - A lost race is reported as `AssignmentConflict`, never retried.
//! - On failure no partial state is visible.

use crate::model::cat::CatId;
use crate::model::mission::{Mission, MissionId};
use crate::repo::mission_repo::MissionRepository;
use crate::service::error::{EntityRef, MissionServiceError};
use crate::service::mission_service::{missing_cat_or, MissionResult};
use log::{info, warn};

/// Concurrency-safe cat-to-mission binder.
pub struct AssignmentCoordinator<R: MissionRepository> {
    repo: R,
}

impl<R: MissionRepository> AssignmentCoordinator<R> {
    /// Creates coordinator from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Assigns `cat_id` to `mission_id`.
    ///
    /// The pre-read only sharpens errors for states that are already
    /// terminal (missing or completed mission, unknown cat). Whether the
    /// assignment lands is decided solely by the conditional write.
    pub fn assign_cat(&self, mission_id: MissionId, cat_id: CatId) -> MissionResult<Mission> {
        let mission = self
            .repo
            .get_mission(mission_id)?
            .ok_or(MissionServiceError::NotFound(EntityRef::Mission(mission_id)))?;
        if mission.is_completed() {
            return Err(rejected(MissionServiceError::MissionCompleted(mission_id)));
        }
        if !self.repo.cat_exists(cat_id)? {
            return Err(rejected(MissionServiceError::NotFound(EntityRef::Cat(cat_id))));
        }

        let changed = self
            .repo
            .assign_cat_if_available(mission_id, cat_id)
            .map_err(|err| missing_cat_or(err, Some(cat_id)))?;
        if changed == 0 {
            return Err(rejected(MissionServiceError::AssignmentConflict { mission_id, cat_id }));
        }

        info!("event=cat_assign module=assignment status=ok mission_id={mission_id} cat_id={cat_id}");
        self.repo
            .get_mission(mission_id)?
            .ok_or(MissionServiceError::NotFound(EntityRef::Mission(mission_id)))
    }
}

fn rejected(err: MissionServiceError) -> MissionServiceError {
    warn!(
        "event=cat_assign module=assignment status=rejected error_code={} error={}",
        err.code(),
        err
    );
    err
}
