//! Mission lifecycle use-case service.
//!
//! # Responsibility
//! - Create missions, attach/mutate/remove targets, complete and delete
//!   missions.
//! - Apply the target ruleset before every target write.
//! - Turn zero-row conditional writes into the specific domain error by
//!   re-reading current state.
//!
//! # Invariants
//! - Mission state moves `Open -> Completed` once; nothing leaves
//!   `Completed`.
//! - Every write that depends on mission or target state carries that state
//!   as a store-side precondition.
//! - Deleting a mission removes all of its targets, completed or not.

use crate::model::cat::CatId;
use crate::model::mission::{Mission, MissionId, Target, TargetDraft, TargetId, TargetUpdate};
use crate::repo::mission_repo::{AppendOutcome, MissionRepository};
use crate::repo::RepoError;
use crate::rules::target_rules::{validate_deletion, validate_mutation, validate_new_batch};
use crate::service::error::{EntityRef, MissionServiceError};
use log::{info, warn};
use uuid::Uuid;

pub type MissionResult<T> = Result<T, MissionServiceError>;

/// Mission lifecycle facade over a mission repository.
pub struct MissionService<R: MissionRepository> {
    repo: R,
}

impl<R: MissionRepository> MissionService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an active mission with 0-3 initial targets.
    ///
    /// With `assign_to`, the cat is bound in the same store transaction via
    /// the assignment conditional write, never a plain write. A failed
    /// assignment persists nothing and returns `AssignmentConflict`.
    pub fn create_mission(
        &self,
        targets: &[TargetDraft],
        assign_to: Option<CatId>,
    ) -> MissionResult<Mission> {
        validate_new_batch(&[], targets)?;
        if let Some(cat_id) = assign_to {
            if !self.repo.cat_exists(cat_id)? {
                return Err(MissionServiceError::NotFound(EntityRef::Cat(cat_id)));
            }
        }

        let mission_id = Uuid::new_v4();
        let created = self
            .repo
            .create_mission(mission_id, targets, assign_to)
            .map_err(|err| missing_cat_or(err, assign_to))?;
        if created == 0 {
            // Only the embedded assignment has a precondition here.
            let Some(cat_id) = assign_to else {
                return Err(MissionServiceError::StaleMission(mission_id));
            };
            warn!(
                "event=mission_create module=mission status=rejected error_code=assignment_conflict cat_id={cat_id}"
            );
            return Err(MissionServiceError::AssignmentConflict { mission_id, cat_id });
        }

        info!(
            "event=mission_create module=mission status=ok mission_id={mission_id} targets={} assigned={}",
            targets.len(),
            assign_to.is_some()
        );
        self.get_mission(mission_id)
    }

    /// Loads one mission with its targets.
    pub fn get_mission(&self, mission_id: MissionId) -> MissionResult<Mission> {
        self.repo
            .get_mission(mission_id)?
            .ok_or(MissionServiceError::NotFound(EntityRef::Mission(mission_id)))
    }

    /// Lists all missions, oldest first.
    pub fn list_missions(&self) -> MissionResult<Vec<Mission>> {
        Ok(self.repo.list_missions()?)
    }

    /// Appends a batch of targets to an active mission.
    ///
    /// The pre-read check gives early errors; the store re-applies the
    /// ruleset against the targets present at write time, so an append
    /// that raced another one is judged on capacity and names alone.
    pub fn add_targets(
        &self,
        mission_id: MissionId,
        targets: &[TargetDraft],
    ) -> MissionResult<Mission> {
        let mission = self.get_mission(mission_id)?;
        if mission.is_completed() {
            return Err(MissionServiceError::MissionCompleted(mission_id));
        }
        if targets.is_empty() {
            return Err(MissionServiceError::InvalidField {
                field: "targets",
                reason: "at least one target is required".to_string(),
            });
        }
        validate_new_batch(&mission.targets, targets)?;

        let err = match self.repo.append_targets_if_admissible(mission_id, targets)? {
            AppendOutcome::Appended(inserted) => {
                info!(
                    "event=targets_add module=mission status=ok mission_id={mission_id} added={inserted}"
                );
                return self.get_mission(mission_id);
            }
            AppendOutcome::MissionMissing => {
                MissionServiceError::NotFound(EntityRef::Mission(mission_id))
            }
            AppendOutcome::MissionCompleted => MissionServiceError::MissionCompleted(mission_id),
            AppendOutcome::Rejected(rule) => rule.into(),
        };
        warn!(
            "event=targets_add module=mission status=rejected mission_id={mission_id} error_code={}",
            err.code()
        );
        Err(err)
    }

    /// Updates notes and/or completes one target of an active mission.
    pub fn update_target(
        &self,
        mission_id: MissionId,
        target_id: TargetId,
        request: &TargetUpdate,
    ) -> MissionResult<Target> {
        let target = self.load_owned_target(mission_id, target_id)?;
        let merged = validate_mutation(&target, request)?;

        if self.repo.update_target_if_open(&merged)? == 0 {
            let err = self.diagnose_target_write(mission_id, target_id);
            warn!(
                "event=target_update module=mission status=rejected mission_id={mission_id} target_id={target_id} error_code={}",
                err.code()
            );
            return Err(err);
        }

        info!(
            "event=target_update module=mission status=ok mission_id={mission_id} target_id={target_id} completed={}",
            merged.is_completed()
        );
        self.repo
            .get_target(target_id)?
            .ok_or(MissionServiceError::NotFound(EntityRef::Target(target_id)))
    }

    /// Deletes one open target of an active mission.
    pub fn delete_target(&self, mission_id: MissionId, target_id: TargetId) -> MissionResult<()> {
        let target = self.load_owned_target(mission_id, target_id)?;
        validate_deletion(&target)?;

        if self.repo.delete_target_if_open(mission_id, target_id)? == 0 {
            let err = self.diagnose_target_write(mission_id, target_id);
            warn!(
                "event=target_delete module=mission status=rejected mission_id={mission_id} target_id={target_id} error_code={}",
                err.code()
            );
            return Err(err);
        }

        info!(
            "event=target_delete module=mission status=ok mission_id={mission_id} target_id={target_id}"
        );
        Ok(())
    }

    /// Marks an active mission completed.
    ///
    /// Completing an already-completed mission fails with
    /// `MissionAlreadyCompleted` so callers notice stale state.
    pub fn complete_mission(&self, mission_id: MissionId) -> MissionResult<Mission> {
        if self.repo.complete_mission_if_active(mission_id)? == 0 {
            let err = match self.repo.get_mission(mission_id)? {
                None => MissionServiceError::NotFound(EntityRef::Mission(mission_id)),
                Some(mission) if mission.is_completed() => {
                    MissionServiceError::MissionAlreadyCompleted(mission_id)
                }
                Some(_) => MissionServiceError::StaleMission(mission_id),
            };
            warn!(
                "event=mission_complete module=mission status=rejected mission_id={mission_id} error_code={}",
                err.code()
            );
            return Err(err);
        }

        info!("event=mission_complete module=mission status=ok mission_id={mission_id}");
        self.get_mission(mission_id)
    }

    /// Deletes an unassigned mission together with all of its targets.
    pub fn delete_mission(&self, mission_id: MissionId) -> MissionResult<()> {
        if self.repo.delete_mission_if_unassigned(mission_id)? == 0 {
            let err = match self.repo.get_mission(mission_id)? {
                None => MissionServiceError::NotFound(EntityRef::Mission(mission_id)),
                Some(Mission {
                    assigned_cat: Some(cat_id),
                    ..
                }) => MissionServiceError::MissionHasAssignedCat { mission_id, cat_id },
                Some(_) => MissionServiceError::StaleMission(mission_id),
            };
            warn!(
                "event=mission_delete module=mission status=rejected mission_id={mission_id} error_code={}",
                err.code()
            );
            return Err(err);
        }

        info!("event=mission_delete module=mission status=ok mission_id={mission_id}");
        Ok(())
    }

    /// Loads a target after checking the mission exists, is active and owns it.
    fn load_owned_target(
        &self,
        mission_id: MissionId,
        target_id: TargetId,
    ) -> MissionResult<Target> {
        let mission = self.get_mission(mission_id)?;
        if mission.is_completed() {
            return Err(MissionServiceError::MissionCompleted(mission_id));
        }
        let target = self
            .repo
            .get_target(target_id)?
            .ok_or(MissionServiceError::NotFound(EntityRef::Target(target_id)))?;
        if target.mission_id != mission_id {
            return Err(MissionServiceError::TargetNotInMission {
                mission_id,
                target_id,
            });
        }
        Ok(target)
    }

    fn diagnose_target_write(
        &self,
        mission_id: MissionId,
        target_id: TargetId,
    ) -> MissionServiceError {
        match self.load_owned_target(mission_id, target_id) {
            Err(err) => err,
            Ok(target) if target.is_completed() => MissionServiceError::TargetFrozen(target_id),
            Ok(_) => MissionServiceError::StaleMission(mission_id),
        }
    }
}

/// A foreign key failure during an assigning write means the cat vanished.
pub(crate) fn missing_cat_or(err: RepoError, cat_id: Option<CatId>) -> MissionServiceError {
    match (err, cat_id) {
        (RepoError::ReferenceViolation(_), Some(cat_id)) => {
            MissionServiceError::NotFound(EntityRef::Cat(cat_id))
        }
        (other, _) => MissionServiceError::Repo(other),
    }
}
