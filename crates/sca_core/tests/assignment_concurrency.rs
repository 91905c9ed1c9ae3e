use sca_core::db::open_db;
use sca_core::{
    AssignmentCoordinator, CatRepository, MissionService, MissionServiceError, NewCat,
    SqliteCatRepository, SqliteMissionRepository, TargetDraft, MAX_TARGETS_PER_MISSION,
};
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;
use uuid::Uuid;

const CONTENDERS: usize = 6;

fn assign_on_own_connection(path: &Path, mission_id: Uuid, cat_id: Uuid) -> Result<(), String> {
    let conn = open_db(path).map_err(|err| err.to_string())?;
    let repo = SqliteMissionRepository::try_new(&conn).map_err(|err| err.to_string())?;
    match AssignmentCoordinator::new(repo).assign_cat(mission_id, cat_id) {
        Ok(_) => Ok(()),
        Err(MissionServiceError::AssignmentConflict { .. }) => Err("conflict".to_string()),
        Err(other) => Err(format!("unexpected: {other}")),
    }
}

#[test]
fn concurrent_assignments_of_one_cat_admit_exactly_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");

    let conn = open_db(&path).unwrap();
    let cat_id = SqliteCatRepository::try_new(&conn)
        .unwrap()
        .create_cat(
            Uuid::new_v4(),
            &NewCat {
                name: "Shadow".to_string(),
                years_of_experience: 7,
                breed: "Siamese".to_string(),
                salary_cents: 300_000,
            },
        )
        .unwrap()
        .id;
    let missions = MissionService::new(SqliteMissionRepository::try_new(&conn).unwrap());
    let mission_ids: Vec<Uuid> = (0..CONTENDERS)
        .map(|_| missions.create_mission(&[], None).unwrap().id)
        .collect();

    let barrier = Arc::new(Barrier::new(CONTENDERS));
    let handles: Vec<_> = mission_ids
        .iter()
        .copied()
        .map(|mission_id| {
            let barrier = Arc::clone(&barrier);
            let path = path.clone();
            thread::spawn(move || {
                barrier.wait();
                assign_on_own_connection(&path, mission_id, cat_id)
            })
        })
        .collect();
    let outcomes: Vec<Result<(), String>> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let winners = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(winners, 1, "outcomes: {outcomes:?}");
    for outcome in outcomes.iter().filter_map(|outcome| outcome.as_ref().err()) {
        assert_eq!(outcome, "conflict");
    }

    let holders: Vec<Uuid> = missions
        .list_missions()
        .unwrap()
        .into_iter()
        .filter(|mission| mission.assigned_cat == Some(cat_id))
        .map(|mission| mission.id)
        .collect();
    assert_eq!(holders.len(), 1);

    // Once the winning mission completes the cat is free again.
    missions.complete_mission(holders[0]).unwrap();
    let next = mission_ids
        .iter()
        .copied()
        .find(|id| *id != holders[0])
        .unwrap();
    assign_on_own_connection(&path, next, cat_id).unwrap();
}

#[test]
fn concurrent_target_appends_fill_capacity_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("append.db");

    let conn = open_db(&path).unwrap();
    let missions = MissionService::new(SqliteMissionRepository::try_new(&conn).unwrap());
    let mission_id = missions.create_mission(&[], None).unwrap().id;

    let barrier = Arc::new(Barrier::new(CONTENDERS));
    let handles: Vec<_> = (0..CONTENDERS)
        .map(|index| {
            let barrier = Arc::clone(&barrier);
            let path = path.clone();
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let service =
                    MissionService::new(SqliteMissionRepository::try_new(&conn).unwrap());
                let draft = TargetDraft::new(format!("Target {index}"), "Chile");
                barrier.wait();
                service
                    .add_targets(mission_id, &[draft])
                    .map(|_| ())
                    .map_err(|err| err.code())
            })
        })
        .collect();
    let outcomes: Vec<Result<(), &'static str>> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let accepted = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(accepted, MAX_TARGETS_PER_MISSION, "outcomes: {outcomes:?}");
    for outcome in outcomes.iter().filter_map(|outcome| outcome.err()) {
        assert_eq!(outcome, "capacity_exceeded");
    }
    let stored = missions.get_mission(mission_id).unwrap();
    assert_eq!(stored.targets.len(), MAX_TARGETS_PER_MISSION);
}
