//! Cat repository contract and SQLite implementation.
//!
//! # Invariants
//! - Salary is the only column mutated after creation.
//! - Deleting a cat still referenced by any mission is a zero-row write.
//!   The `ON DELETE RESTRICT` foreign key backs the predicate and surfaces
//!   as [`RepoError::ReferenceViolation`].

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::cat::{Cat, CatId, NewCat};
use rusqlite::{params, Connection, OptionalExtension, Row};

const CAT_SELECT_SQL: &str = "SELECT
    id,
    name,
    years_of_experience,
    breed,
    salary_cents,
    created_at,
    updated_at
FROM cats";

/// Repository interface for cat CRUD.
pub trait CatRepository {
    /// Inserts one cat under `id` and returns the stored row.
    fn create_cat(&self, id: CatId, cat: &NewCat) -> RepoResult<Cat>;
    fn get_cat(&self, id: CatId) -> RepoResult<Option<Cat>>;
    /// Lists cats in creation order.
    fn list_cats(&self) -> RepoResult<Vec<Cat>>;
    /// Returns affected rows (`0` when the cat does not exist).
    fn update_salary(&self, id: CatId, salary_cents: i64) -> RepoResult<usize>;
    /// Deletes the cat if no mission references it. Returns affected rows;
    /// `0` when the cat is missing or still referenced.
    fn delete_cat(&self, id: CatId) -> RepoResult<usize>;
}

/// SQLite-backed cat repository.
#[derive(Clone, Copy)]
pub struct SqliteCatRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CatRepository for SqliteCatRepository<'_> {
    fn create_cat(&self, id: CatId, cat: &NewCat) -> RepoResult<Cat> {
        self.conn.execute(
            "INSERT INTO cats (
                id,
                name,
                years_of_experience,
                breed,
                salary_cents,
                seq
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                (SELECT COALESCE(MAX(seq), 0) + 1 FROM cats)
            );",
            params![
                id.to_string(),
                cat.name.as_str(),
                cat.years_of_experience,
                cat.breed.as_str(),
                cat.salary_cents,
            ],
        )?;

        self.get_cat(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("cat {id} missing after insert"))
        })
    }

    fn get_cat(&self, id: CatId) -> RepoResult<Option<Cat>> {
        let mut stmt = self.conn.prepare(&format!("{CAT_SELECT_SQL} WHERE id = ?1;"))?;
        let raw = stmt
            .query_row([id.to_string()], RawCat::from_row)
            .optional()?;
        raw.map(RawCat::into_cat).transpose()
    }

    fn list_cats(&self) -> RepoResult<Vec<Cat>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CAT_SELECT_SQL} ORDER BY seq ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut cats = Vec::new();
        while let Some(row) = rows.next()? {
            cats.push(RawCat::from_row(row)?.into_cat()?);
        }
        Ok(cats)
    }

    fn update_salary(&self, id: CatId, salary_cents: i64) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE cats
             SET salary_cents = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), salary_cents],
        )?;
        Ok(changed)
    }

    fn delete_cat(&self, id: CatId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "DELETE FROM cats
             WHERE id = ?1
               AND NOT EXISTS (
                 SELECT 1
                 FROM missions m
                 WHERE m.assigned_cat_id = ?1
               );",
            [id.to_string()],
        )?;
        Ok(changed)
    }
}

/// Column values as read, before uuid validation.
struct RawCat {
    id: String,
    name: String,
    years_of_experience: i64,
    breed: String,
    salary_cents: i64,
    created_at: i64,
    updated_at: i64,
}

impl RawCat {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            years_of_experience: row.get("years_of_experience")?,
            breed: row.get("breed")?,
            salary_cents: row.get("salary_cents")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_cat(self) -> RepoResult<Cat> {
        Ok(Cat {
            id: parse_uuid(&self.id, "cats.id")?,
            name: self.name,
            years_of_experience: self.years_of_experience,
            breed: self.breed,
            salary_cents: self.salary_cents,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
