//! Mission/target repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Load mission aggregates together with their targets.
//! - Expose every mission-level mutation as a conditional write whose
//!   precondition is evaluated by SQLite at write time.
//!
//! # Invariants
//! - No method reads a row, decides in Rust, and then writes it back
//!   unconditionally. The deciding predicate is part of the write.
//! - Multi-statement writes run in an IMMEDIATE transaction; a failed
//!   precondition rolls back everything written so far.
//! - Target appends re-run the target ruleset inside their transaction, so
//!   capacity and name uniqueness hold against the committed target set.
//! - At most one non-completed mission references a given cat. The
//!   assignment predicate checks it and `uq_missions_active_cat` backs it.
//! - Deleting a mission cascades to its targets through the foreign key.

use super::{
    conditional_outcome, ensure_connection_ready, is_unique_violation, parse_flag, parse_uuid,
    RepoResult,
};
use crate::model::cat::CatId;
use crate::model::completion::Completion;
use crate::model::mission::{Mission, MissionId, Target, TargetDraft, TargetId};
use crate::rules::target_rules::{validate_new_batch, TargetRuleError};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;
use uuid::Uuid;

const MISSION_SELECT_SQL: &str = "SELECT
    id,
    assigned_cat_id,
    completed,
    created_at,
    updated_at
FROM missions";

const TARGET_SELECT_SQL: &str = "SELECT
    id,
    mission_id,
    name,
    country,
    notes,
    completed,
    created_at,
    updated_at
FROM targets";

/// Binds a cat only if the mission is still active and unassigned and no
/// other active mission holds the cat, all evaluated at write time.
const ASSIGN_CAT_SQL: &str = "UPDATE missions
SET assigned_cat_id = ?2,
    updated_at = (strftime('%s', 'now') * 1000)
WHERE id = ?1
  AND completed = 0
  AND assigned_cat_id IS NULL
  AND NOT EXISTS (
    SELECT 1
    FROM missions other
    WHERE other.assigned_cat_id = ?2
      AND other.completed = 0
  );";

/// Result of a checked target append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Number of targets inserted.
    Appended(usize),
    MissionMissing,
    MissionCompleted,
    /// Batch violates the ruleset against the current targets.
    Rejected(TargetRuleError),
}

/// Store contract for the mission aggregate.
///
/// Methods named `*_if_*` are conditional writes returning affected rows.
pub trait MissionRepository {
    /// Loads one mission with targets in insertion order.
    fn get_mission(&self, id: MissionId) -> RepoResult<Option<Mission>>;
    /// Lists all missions with targets in creation order.
    fn list_missions(&self) -> RepoResult<Vec<Mission>>;
    /// Loads one target regardless of owning mission.
    fn get_target(&self, id: TargetId) -> RepoResult<Option<Target>>;
    /// Returns whether a cat row exists.
    fn cat_exists(&self, cat_id: CatId) -> RepoResult<bool>;
    /// Creates one active mission with its initial targets.
    ///
    /// With `assign_to`, the assignment goes through the same conditional
    /// write as [`MissionRepository::assign_cat_if_available`] inside the
    /// creating transaction. Returns `0` (and persists nothing) when that
    /// assignment precondition fails, `1` otherwise.
    fn create_mission(
        &self,
        id: MissionId,
        targets: &[TargetDraft],
        assign_to: Option<CatId>,
    ) -> RepoResult<usize>;
    /// Appends targets if, at write time, the mission is active and the
    /// batch passes the target ruleset against the targets it holds then.
    fn append_targets_if_admissible(
        &self,
        mission_id: MissionId,
        targets: &[TargetDraft],
    ) -> RepoResult<AppendOutcome>;
    /// Sets `assigned_cat_id` under the active/unassigned/exclusive predicate.
    fn assign_cat_if_available(&self, mission_id: MissionId, cat_id: CatId) -> RepoResult<usize>;
    /// Flips `completed` from 0 to 1.
    fn complete_mission_if_active(&self, mission_id: MissionId) -> RepoResult<usize>;
    /// Deletes the mission and its targets if no cat is assigned.
    fn delete_mission_if_unassigned(&self, mission_id: MissionId) -> RepoResult<usize>;
    /// Writes `notes` and `completed` of `target` if both the target and its
    /// mission are still open.
    fn update_target_if_open(&self, target: &Target) -> RepoResult<usize>;
    /// Deletes the target if both it and its mission are still open.
    fn delete_target_if_open(&self, mission_id: MissionId, target_id: TargetId)
        -> RepoResult<usize>;
}

/// SQLite-backed mission repository.
#[derive(Clone, Copy)]
pub struct SqliteMissionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMissionRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl MissionRepository for SqliteMissionRepository<'_> {
    fn get_mission(&self, id: MissionId) -> RepoResult<Option<Mission>> {
        // Deferred read transaction: mission row and targets come from one snapshot.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let raw = tx
            .query_row(
                &format!("{MISSION_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                RawMission::from_row,
            )
            .optional()?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        let targets = load_targets(&tx, id)?;
        tx.commit()?;

        Ok(Some(raw.into_mission(targets)?))
    }

    fn list_missions(&self) -> RepoResult<Vec<Mission>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;

        let mut targets_by_mission: HashMap<MissionId, Vec<Target>> = HashMap::new();
        {
            let mut stmt = tx.prepare(&format!(
                "{TARGET_SELECT_SQL} ORDER BY mission_id ASC, position ASC, id ASC;"
            ))?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let target = parse_target_row(row)?;
                targets_by_mission
                    .entry(target.mission_id)
                    .or_default()
                    .push(target);
            }
        }

        let mut missions = Vec::new();
        {
            let mut stmt = tx.prepare(&format!(
                "{MISSION_SELECT_SQL} ORDER BY seq ASC;"
            ))?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let raw = RawMission::from_row(row)?;
                let id = parse_uuid(&raw.id, "missions.id")?;
                let targets = targets_by_mission.remove(&id).unwrap_or_default();
                missions.push(raw.into_mission(targets)?);
            }
        }
        tx.commit()?;

        Ok(missions)
    }

    fn get_target(&self, id: TargetId) -> RepoResult<Option<Target>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TARGET_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_target_row(row)?));
        }
        Ok(None)
    }

    fn cat_exists(&self, cat_id: CatId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM cats WHERE id = ?1);",
            [cat_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn create_mission(
        &self,
        id: MissionId,
        targets: &[TargetDraft],
        assign_to: Option<CatId>,
    ) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO missions (id, assigned_cat_id, completed, seq)
             VALUES (?1, NULL, 0, (SELECT COALESCE(MAX(seq), 0) + 1 FROM missions));",
            [id.to_string()],
        )?;
        for (position, draft) in targets.iter().enumerate() {
            insert_target(&tx, id, position as i64, draft)?;
        }

        if let Some(cat_id) = assign_to {
            let assigned = conditional_outcome(
                tx.execute(ASSIGN_CAT_SQL, params![id.to_string(), cat_id.to_string()]),
            )?;
            if assigned == 0 {
                return Ok(0);
            }
        }

        tx.commit()?;
        Ok(1)
    }

    fn append_targets_if_admissible(
        &self,
        mission_id: MissionId,
        targets: &[TargetDraft],
    ) -> RepoResult<AppendOutcome> {
        // IMMEDIATE: no other writer can change the target set between the
        // ruleset check and the inserts.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let completed: Option<i64> = tx
            .query_row(
                "SELECT completed FROM missions WHERE id = ?1;",
                [mission_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match completed {
            None => return Ok(AppendOutcome::MissionMissing),
            Some(flag) if parse_flag(flag, "missions.completed")? => {
                return Ok(AppendOutcome::MissionCompleted);
            }
            Some(_) => {}
        }

        let existing = load_targets(&tx, mission_id)?;
        if let Err(rule) = validate_new_batch(&existing, targets) {
            return Ok(AppendOutcome::Rejected(rule));
        }

        let last_position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position), -1) FROM targets WHERE mission_id = ?1;",
            [mission_id.to_string()],
            |row| row.get(0),
        )?;
        for (offset, draft) in targets.iter().enumerate() {
            match insert_target(&tx, mission_id, last_position + 1 + offset as i64, draft) {
                Ok(()) => {}
                Err(err) if is_unique_violation(&err) => {
                    return Ok(AppendOutcome::Rejected(TargetRuleError::DuplicateName(
                        draft.name.clone(),
                    )));
                }
                Err(err) => return Err(err.into()),
            }
        }
        tx.execute(
            "UPDATE missions
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [mission_id.to_string()],
        )?;

        tx.commit()?;
        Ok(AppendOutcome::Appended(targets.len()))
    }

    fn assign_cat_if_available(&self, mission_id: MissionId, cat_id: CatId) -> RepoResult<usize> {
        conditional_outcome(self.conn.execute(
            ASSIGN_CAT_SQL,
            params![mission_id.to_string(), cat_id.to_string()],
        ))
    }

    fn complete_mission_if_active(&self, mission_id: MissionId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE missions
             SET completed = 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND completed = 0;",
            [mission_id.to_string()],
        )?;
        Ok(changed)
    }

    fn delete_mission_if_unassigned(&self, mission_id: MissionId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "DELETE FROM missions
             WHERE id = ?1
               AND assigned_cat_id IS NULL;",
            [mission_id.to_string()],
        )?;
        Ok(changed)
    }

    fn update_target_if_open(&self, target: &Target) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE targets
             SET notes = ?3,
                 completed = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND mission_id = ?2
               AND completed = 0
               AND EXISTS (
                 SELECT 1
                 FROM missions m
                 WHERE m.id = ?2
                   AND m.completed = 0
               );",
            params![
                target.id.to_string(),
                target.mission_id.to_string(),
                target.notes.as_str(),
                target.state.as_flag(),
            ],
        )?;
        Ok(changed)
    }

    fn delete_target_if_open(
        &self,
        mission_id: MissionId,
        target_id: TargetId,
    ) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "DELETE FROM targets
             WHERE id = ?1
               AND mission_id = ?2
               AND completed = 0
               AND EXISTS (
                 SELECT 1
                 FROM missions m
                 WHERE m.id = ?2
                   AND m.completed = 0
               );",
            params![target_id.to_string(), mission_id.to_string()],
        )?;
        Ok(changed)
    }
}

fn load_targets(conn: &Connection, mission_id: MissionId) -> RepoResult<Vec<Target>> {
    let mut stmt = conn.prepare(&format!(
        "{TARGET_SELECT_SQL} WHERE mission_id = ?1 ORDER BY position ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([mission_id.to_string()])?;
    let mut targets = Vec::new();
    while let Some(row) = rows.next()? {
        targets.push(parse_target_row(row)?);
    }
    Ok(targets)
}

fn insert_target(
    conn: &Connection,
    mission_id: MissionId,
    position: i64,
    draft: &TargetDraft,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO targets (
            id,
            mission_id,
            position,
            name,
            country,
            notes,
            completed
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0);",
        params![
            Uuid::new_v4().to_string(),
            mission_id.to_string(),
            position,
            draft.name.as_str(),
            draft.country.as_str(),
            draft.notes.as_str(),
        ],
    )?;
    Ok(())
}

struct RawMission {
    id: String,
    assigned_cat_id: Option<String>,
    completed: i64,
    created_at: i64,
    updated_at: i64,
}

impl RawMission {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            assigned_cat_id: row.get("assigned_cat_id")?,
            completed: row.get("completed")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_mission(self, targets: Vec<Target>) -> RepoResult<Mission> {
        Ok(Mission {
            id: parse_uuid(&self.id, "missions.id")?,
            assigned_cat: self
                .assigned_cat_id
                .map(|value| parse_uuid(&value, "missions.assigned_cat_id"))
                .transpose()?,
            state: Completion::from_flag(parse_flag(self.completed, "missions.completed")?),
            targets,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn parse_target_row(row: &Row<'_>) -> RepoResult<Target> {
    let id_text: String = row.get("id")?;
    let mission_text: String = row.get("mission_id")?;
    let completed: i64 = row.get("completed")?;

    Ok(Target {
        id: parse_uuid(&id_text, "targets.id")?,
        mission_id: parse_uuid(&mission_text, "targets.mission_id")?,
        name: row.get("name")?,
        country: row.get("country")?,
        notes: row.get("notes")?,
        state: Completion::from_flag(parse_flag(completed, "targets.completed")?),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
