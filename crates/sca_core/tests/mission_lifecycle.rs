use rusqlite::Connection;
use sca_core::db::open_db_in_memory;
use sca_core::{
    AppendOutcome, AssignmentCoordinator, CatId, CatRepository, EntityRef, Mission, MissionId,
    MissionRepository, MissionServiceError, MissionService, NewCat, RepoResult,
    SqliteCatRepository, SqliteMissionRepository, Target, TargetDraft, TargetId, TargetUpdate,
};
use uuid::Uuid;

/// Lands `interloper` through the store right before every append, the
/// way a concurrent request would between the service's read and write.
struct InterleavedAppends<'conn> {
    inner: SqliteMissionRepository<'conn>,
    interloper: Vec<TargetDraft>,
}

impl MissionRepository for InterleavedAppends<'_> {
    fn get_mission(&self, id: MissionId) -> RepoResult<Option<Mission>> {
        self.inner.get_mission(id)
    }

    fn list_missions(&self) -> RepoResult<Vec<Mission>> {
        self.inner.list_missions()
    }

    fn get_target(&self, id: TargetId) -> RepoResult<Option<Target>> {
        self.inner.get_target(id)
    }

    fn cat_exists(&self, cat_id: CatId) -> RepoResult<bool> {
        self.inner.cat_exists(cat_id)
    }

    fn create_mission(
        &self,
        id: MissionId,
        targets: &[TargetDraft],
        assign_to: Option<CatId>,
    ) -> RepoResult<usize> {
        self.inner.create_mission(id, targets, assign_to)
    }

    fn append_targets_if_admissible(
        &self,
        mission_id: MissionId,
        targets: &[TargetDraft],
    ) -> RepoResult<AppendOutcome> {
        let landed = self
            .inner
            .append_targets_if_admissible(mission_id, &self.interloper)?;
        assert!(matches!(landed, AppendOutcome::Appended(_)));
        self.inner.append_targets_if_admissible(mission_id, targets)
    }

    fn assign_cat_if_available(&self, mission_id: MissionId, cat_id: CatId) -> RepoResult<usize> {
        self.inner.assign_cat_if_available(mission_id, cat_id)
    }

    fn complete_mission_if_active(&self, mission_id: MissionId) -> RepoResult<usize> {
        self.inner.complete_mission_if_active(mission_id)
    }

    fn delete_mission_if_unassigned(&self, mission_id: MissionId) -> RepoResult<usize> {
        self.inner.delete_mission_if_unassigned(mission_id)
    }

    fn update_target_if_open(&self, target: &Target) -> RepoResult<usize> {
        self.inner.update_target_if_open(target)
    }

    fn delete_target_if_open(
        &self,
        mission_id: MissionId,
        target_id: TargetId,
    ) -> RepoResult<usize> {
        self.inner.delete_target_if_open(mission_id, target_id)
    }
}

fn interleaved<'conn>(
    conn: &'conn Connection,
    interloper: &[&str],
) -> MissionService<InterleavedAppends<'conn>> {
    MissionService::new(InterleavedAppends {
        inner: SqliteMissionRepository::try_new(conn).unwrap(),
        interloper: drafts(interloper),
    })
}

fn services(
    conn: &Connection,
) -> (
    MissionService<SqliteMissionRepository<'_>>,
    AssignmentCoordinator<SqliteMissionRepository<'_>>,
) {
    let repo = SqliteMissionRepository::try_new(conn).unwrap();
    (MissionService::new(repo), AssignmentCoordinator::new(repo))
}

fn seed_cat(conn: &Connection, name: &str) -> CatId {
    let repo = SqliteCatRepository::try_new(conn).unwrap();
    let cat = NewCat {
        name: name.to_string(),
        years_of_experience: 4,
        breed: "Bengal".to_string(),
        salary_cents: 150_000,
    };
    repo.create_cat(Uuid::new_v4(), &cat).unwrap().id
}

fn drafts(names: &[&str]) -> Vec<TargetDraft> {
    names
        .iter()
        .map(|name| TargetDraft::new(*name, "Portugal"))
        .collect()
}

#[test]
fn create_mission_persists_targets_in_order() {
    let conn = open_db_in_memory().unwrap();
    let (missions, _) = services(&conn);

    let mission = missions
        .create_mission(&drafts(&["Ari", "Bo"]), None)
        .unwrap();

    assert!(!mission.is_completed());
    assert!(mission.assigned_cat.is_none());
    let names: Vec<&str> = mission.targets.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Ari", "Bo"]);
    assert!(mission.targets.iter().all(|t| !t.is_completed()));
    assert_eq!(missions.get_mission(mission.id).unwrap(), mission);
}

#[test]
fn create_mission_rejects_too_many_or_duplicate_targets() {
    let conn = open_db_in_memory().unwrap();
    let (missions, _) = services(&conn);

    let err = missions
        .create_mission(&drafts(&["Ari", "Bo", "Cy", "Di"]), None)
        .unwrap_err();
    assert!(matches!(err, MissionServiceError::CapacityExceeded { .. }));

    let err = missions
        .create_mission(&drafts(&["Ari", "Ari"]), None)
        .unwrap_err();
    assert!(matches!(err, MissionServiceError::DuplicateName(name) if name == "Ari"));
    assert!(missions.list_missions().unwrap().is_empty());
}

#[test]
fn add_targets_never_exceeds_capacity() {
    let conn = open_db_in_memory().unwrap();
    let (missions, _) = services(&conn);
    let mission = missions.create_mission(&drafts(&["Ari"]), None).unwrap();

    let grown = missions.add_targets(mission.id, &drafts(&["Bo"])).unwrap();
    assert_eq!(grown.targets.len(), 2);

    let err = missions
        .add_targets(mission.id, &drafts(&["Cy", "Di"]))
        .unwrap_err();
    assert!(matches!(
        err,
        MissionServiceError::CapacityExceeded {
            existing: 2,
            incoming: 2,
            max: 3
        }
    ));
    assert_eq!(missions.get_mission(mission.id).unwrap().targets, grown.targets);

    let full = missions.add_targets(mission.id, &drafts(&["Cy"])).unwrap();
    assert_eq!(full.targets.len(), 3);
    let err = missions
        .add_targets(mission.id, &drafts(&["Di"]))
        .unwrap_err();
    assert_eq!(err.code(), "capacity_exceeded");
}

#[test]
fn add_targets_rejects_duplicate_names_without_partial_insert() {
    let conn = open_db_in_memory().unwrap();
    let (missions, _) = services(&conn);
    let mission = missions.create_mission(&drafts(&["Ari"]), None).unwrap();

    let err = missions
        .add_targets(mission.id, &drafts(&["Bo", "Ari"]))
        .unwrap_err();
    assert!(matches!(err, MissionServiceError::DuplicateName(name) if name == "Ari"));
    assert_eq!(missions.get_mission(mission.id).unwrap().targets.len(), 1);

    // Names match exactly; a different case is a different target.
    let added = missions.add_targets(mission.id, &drafts(&["ari"])).unwrap();
    assert_eq!(added.targets.len(), 2);
}

#[test]
fn add_targets_rejects_empty_batch_and_unknown_mission() {
    let conn = open_db_in_memory().unwrap();
    let (missions, _) = services(&conn);
    let mission = missions.create_mission(&[], None).unwrap();

    let err = missions.add_targets(mission.id, &[]).unwrap_err();
    assert!(matches!(
        err,
        MissionServiceError::InvalidField {
            field: "targets",
            ..
        }
    ));

    let unknown = Uuid::new_v4();
    let err = missions.add_targets(unknown, &drafts(&["Ari"])).unwrap_err();
    assert!(matches!(
        err,
        MissionServiceError::NotFound(EntityRef::Mission(id)) if id == unknown
    ));
}

#[test]
fn append_after_concurrent_append_lands_when_batch_still_fits() {
    let conn = open_db_in_memory().unwrap();
    let (missions, _) = services(&conn);
    let mission = missions.create_mission(&[], None).unwrap();

    let grown = interleaved(&conn, &["Other"])
        .add_targets(mission.id, &drafts(&["Ari"]))
        .unwrap();

    let names: Vec<&str> = grown.targets.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Other", "Ari"]);
}

#[test]
fn append_after_concurrent_append_reports_the_broken_rule() {
    let conn = open_db_in_memory().unwrap();
    let (missions, _) = services(&conn);
    let mission = missions.create_mission(&drafts(&["Ari"]), None).unwrap();

    let err = interleaved(&conn, &["Bo"])
        .add_targets(mission.id, &drafts(&["Cy", "Di"]))
        .unwrap_err();
    assert!(matches!(
        err,
        MissionServiceError::CapacityExceeded {
            existing: 2,
            incoming: 2,
            max: 3
        }
    ));

    let stored = missions.get_mission(mission.id).unwrap();
    let names: Vec<&str> = stored.targets.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Ari", "Bo"]);

    let other = missions.create_mission(&[], None).unwrap();
    let err = interleaved(&conn, &["Cy"])
        .add_targets(other.id, &drafts(&["Cy"]))
        .unwrap_err();
    assert!(matches!(err, MissionServiceError::DuplicateName(name) if name == "Cy"));
    assert_eq!(missions.get_mission(other.id).unwrap().targets.len(), 1);
}

#[test]
fn list_missions_returns_creation_order() {
    let conn = open_db_in_memory().unwrap();
    let (missions, _) = services(&conn);

    let created: Vec<MissionId> = (0..8)
        .map(|_| missions.create_mission(&[], None).unwrap().id)
        .collect();
    missions.delete_mission(created[7]).unwrap();
    let last = missions.create_mission(&[], None).unwrap().id;

    let listed: Vec<MissionId> = missions
        .list_missions()
        .unwrap()
        .into_iter()
        .map(|mission| mission.id)
        .collect();
    let mut expected = created[..7].to_vec();
    expected.push(last);
    assert_eq!(listed, expected);
}

#[test]
fn completed_target_is_frozen() {
    let conn = open_db_in_memory().unwrap();
    let (missions, _) = services(&conn);
    let mission = missions
        .create_mission(&drafts(&["Ari", "Bo"]), None)
        .unwrap();
    let ari = mission.targets[0].id;

    let updated = missions
        .update_target(mission.id, ari, &TargetUpdate::notes("seen at the docks"))
        .unwrap();
    assert_eq!(updated.notes, "seen at the docks");

    let completed = missions
        .update_target(mission.id, ari, &TargetUpdate::complete())
        .unwrap();
    assert!(completed.is_completed());
    assert_eq!(completed.notes, "seen at the docks");

    let err = missions
        .update_target(mission.id, ari, &TargetUpdate::notes("rewrite"))
        .unwrap_err();
    assert!(matches!(err, MissionServiceError::TargetFrozen(id) if id == ari));
    let err = missions.delete_target(mission.id, ari).unwrap_err();
    assert!(matches!(err, MissionServiceError::TargetFrozen(id) if id == ari));

    let stored = missions.get_mission(mission.id).unwrap();
    assert_eq!(stored.target(ari).unwrap().notes, "seen at the docks");
}

#[test]
fn completing_with_notes_in_one_request_mutates_nothing() {
    let conn = open_db_in_memory().unwrap();
    let (missions, _) = services(&conn);
    let mission = missions.create_mission(&drafts(&["Ari"]), None).unwrap();
    let ari = mission.targets[0].id;

    let request = TargetUpdate {
        notes: Some("last words".to_string()),
        complete: true,
    };
    let err = missions.update_target(mission.id, ari, &request).unwrap_err();
    assert!(matches!(err, MissionServiceError::InvalidMutation));

    let stored = missions.get_mission(mission.id).unwrap();
    assert_eq!(stored.targets, mission.targets);
}

#[test]
fn target_operations_require_matching_mission() {
    let conn = open_db_in_memory().unwrap();
    let (missions, _) = services(&conn);
    let first = missions.create_mission(&drafts(&["Ari"]), None).unwrap();
    let second = missions.create_mission(&drafts(&["Bo"]), None).unwrap();
    let foreign = second.targets[0].id;

    let err = missions
        .update_target(first.id, foreign, &TargetUpdate::notes("x"))
        .unwrap_err();
    assert!(matches!(err, MissionServiceError::TargetNotInMission { .. }));
    let err = missions.delete_target(first.id, foreign).unwrap_err();
    assert!(matches!(err, MissionServiceError::TargetNotInMission { .. }));

    let missing = Uuid::new_v4();
    let err = missions.delete_target(first.id, missing).unwrap_err();
    assert!(matches!(err, MissionServiceError::NotFound(EntityRef::Target(id)) if id == missing));
}

#[test]
fn delete_open_target_removes_only_that_target() {
    let conn = open_db_in_memory().unwrap();
    let (missions, _) = services(&conn);
    let mission = missions
        .create_mission(&drafts(&["Ari", "Bo"]), None)
        .unwrap();

    missions.delete_target(mission.id, mission.targets[0].id).unwrap();

    let stored = missions.get_mission(mission.id).unwrap();
    assert_eq!(stored.targets.len(), 1);
    assert_eq!(stored.targets[0].name, "Bo");
}

#[test]
fn assigned_mission_cannot_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    let (missions, assigner) = services(&conn);
    let cat = seed_cat(&conn, "Tom");
    let mission = missions.create_mission(&drafts(&["Ari"]), None).unwrap();
    assigner.assign_cat(mission.id, cat).unwrap();

    let err = missions.delete_mission(mission.id).unwrap_err();
    assert!(matches!(
        err,
        MissionServiceError::MissionHasAssignedCat { mission_id, cat_id }
            if mission_id == mission.id && cat_id == cat
    ));
    assert!(missions.get_mission(mission.id).is_ok());
}

#[test]
fn deleting_mission_removes_all_targets() {
    let conn = open_db_in_memory().unwrap();
    let (missions, _) = services(&conn);
    let mission = missions
        .create_mission(&drafts(&["Ari", "Bo"]), None)
        .unwrap();
    missions
        .update_target(mission.id, mission.targets[0].id, &TargetUpdate::complete())
        .unwrap();

    missions.delete_mission(mission.id).unwrap();

    let repo = SqliteMissionRepository::try_new(&conn).unwrap();
    for target in &mission.targets {
        assert!(repo.get_target(target.id).unwrap().is_none());
    }
    let err = missions.delete_mission(mission.id).unwrap_err();
    assert!(matches!(err, MissionServiceError::NotFound(EntityRef::Mission(_))));
}

#[test]
fn completed_mission_rejects_every_mutation() {
    let conn = open_db_in_memory().unwrap();
    let (missions, assigner) = services(&conn);
    let cat = seed_cat(&conn, "Tom");
    let mission = missions.create_mission(&drafts(&["Ari"]), None).unwrap();
    let ari = mission.targets[0].id;

    let done = missions.complete_mission(mission.id).unwrap();
    assert!(done.is_completed());

    let err = missions.add_targets(mission.id, &drafts(&["Bo"])).unwrap_err();
    assert!(matches!(err, MissionServiceError::MissionCompleted(_)));
    let err = missions
        .update_target(mission.id, ari, &TargetUpdate::notes("late"))
        .unwrap_err();
    assert!(matches!(err, MissionServiceError::MissionCompleted(_)));
    let err = missions.delete_target(mission.id, ari).unwrap_err();
    assert!(matches!(err, MissionServiceError::MissionCompleted(_)));
    let err = assigner.assign_cat(mission.id, cat).unwrap_err();
    assert!(matches!(err, MissionServiceError::MissionCompleted(_)));

    let err = missions.complete_mission(mission.id).unwrap_err();
    assert!(matches!(err, MissionServiceError::MissionAlreadyCompleted(_)));
    assert_eq!(missions.get_mission(mission.id).unwrap(), done);
}

#[test]
fn create_with_busy_cat_persists_nothing() {
    let conn = open_db_in_memory().unwrap();
    let (missions, _) = services(&conn);
    let cat = seed_cat(&conn, "Tom");
    let first = missions
        .create_mission(&drafts(&["Ari"]), Some(cat))
        .unwrap();
    assert_eq!(first.assigned_cat, Some(cat));

    let err = missions
        .create_mission(&drafts(&["Bo"]), Some(cat))
        .unwrap_err();
    assert!(matches!(err, MissionServiceError::AssignmentConflict { cat_id, .. } if cat_id == cat));
    assert_eq!(missions.list_missions().unwrap().len(), 1);

    let unknown = Uuid::new_v4();
    let err = missions
        .create_mission(&drafts(&["Cy"]), Some(unknown))
        .unwrap_err();
    assert!(matches!(err, MissionServiceError::NotFound(EntityRef::Cat(id)) if id == unknown));
}

#[test]
fn assignment_respects_existing_bindings() {
    let conn = open_db_in_memory().unwrap();
    let (missions, assigner) = services(&conn);
    let tom = seed_cat(&conn, "Tom");
    let kit = seed_cat(&conn, "Kit");
    let first = missions.create_mission(&[], None).unwrap();
    let second = missions.create_mission(&[], None).unwrap();

    assigner.assign_cat(first.id, tom).unwrap();

    // Mission already has a cat.
    let err = assigner.assign_cat(first.id, kit).unwrap_err();
    assert!(matches!(err, MissionServiceError::AssignmentConflict { .. }));
    // Cat already active elsewhere.
    let err = assigner.assign_cat(second.id, tom).unwrap_err();
    assert_eq!(err.code(), "assignment_conflict");

    let err = assigner.assign_cat(second.id, Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, MissionServiceError::NotFound(EntityRef::Cat(_))));

    missions.complete_mission(first.id).unwrap();
    let reassigned = assigner.assign_cat(second.id, tom).unwrap();
    assert_eq!(reassigned.assigned_cat, Some(tom));
}

#[test]
fn field_agent_scenario() {
    let conn = open_db_in_memory().unwrap();
    let (missions, assigner) = services(&conn);
    let cat1 = seed_cat(&conn, "Shadow");

    let mission = missions
        .create_mission(&drafts(&["Ari", "Bo"]), None)
        .unwrap();
    assert_eq!(mission.targets.len(), 2);
    assert!(!mission.is_completed());
    let other = missions.create_mission(&[], None).unwrap();

    let assigned = assigner.assign_cat(mission.id, cat1).unwrap();
    assert_eq!(assigned.assigned_cat, Some(cat1));
    let err = assigner.assign_cat(other.id, cat1).unwrap_err();
    assert!(matches!(err, MissionServiceError::AssignmentConflict { .. }));

    let ari = mission.targets[0].id;
    missions
        .update_target(mission.id, ari, &TargetUpdate::complete())
        .unwrap();
    let err = missions
        .add_targets(mission.id, &drafts(&["Ari"]))
        .unwrap_err();
    assert!(matches!(err, MissionServiceError::DuplicateName(_)));

    missions.complete_mission(mission.id).unwrap();
    let err = missions
        .add_targets(mission.id, &drafts(&["Zed"]))
        .unwrap_err();
    assert!(matches!(err, MissionServiceError::MissionCompleted(_)));
}
