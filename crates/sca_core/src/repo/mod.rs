//! Entity store contracts and SQLite persistence implementations.
//!
//! # Responsibility
//! - Define the store primitives the services depend on: read, create,
//!   delete and conditional update per entity kind.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Conditional writes report affected-row counts; `0` means the
//!   precondition no longer held at write time.
//! - A unique-constraint hit inside a conditional write is reported as `0`
//!   rows affected, never as a raw store error.
//! - Read paths reject malformed persisted values instead of masking them.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use rusqlite::{ffi, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod cat_repo;
pub mod mission_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level error shared by all repositories.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// A foreign key check failed: the referenced row is missing, or a
    /// restricting row still points at the row being deleted.
    ReferenceViolation(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ReferenceViolation(message) => write!(f, "reference violation: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "dispatch store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::ReferenceViolation(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if is_reference_violation(&value) {
            return Self::ReferenceViolation(value.to_string());
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Maps a conditional write result onto the affected-count contract.
pub(crate) fn conditional_outcome(result: rusqlite::Result<usize>) -> RepoResult<usize> {
    match result {
        Ok(changed) => Ok(changed),
        Err(err) if is_unique_violation(&err) => Ok(0),
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    has_extended_code(err, ffi::SQLITE_CONSTRAINT_UNIQUE)
}

/// Insert/update checks report `SQLITE_CONSTRAINT_FOREIGNKEY`; a parent
/// delete blocked by `ON DELETE RESTRICT` reports `SQLITE_CONSTRAINT_TRIGGER`.
fn is_reference_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(inner, message) => {
            inner.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY
                || (inner.extended_code == ffi::SQLITE_CONSTRAINT_TRIGGER
                    && message
                        .as_deref()
                        .is_some_and(|text| text.contains("FOREIGN KEY")))
        }
        _ => false,
    }
}

fn has_extended_code(err: &rusqlite::Error, code: i32) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(inner, _) if inner.extended_code == code)
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_flag(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

/// Rejects connections that did not go through `open_db*`.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
