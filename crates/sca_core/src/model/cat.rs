//! Cat (field agent) model.
//!
//! # Invariants
//! - `years_of_experience` and `salary_cents` are never negative.
//! - `breed` was accepted by the breed catalog at creation time; it is not
//!   re-validated afterwards.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CatId = Uuid;

/// Persisted cat record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cat {
    pub id: CatId,
    pub name: String,
    pub years_of_experience: i64,
    pub breed: String,
    /// Salary in the smallest currency unit.
    pub salary_cents: i64,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Input for cat creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCat {
    pub name: String,
    pub years_of_experience: i64,
    pub breed: String,
    pub salary_cents: i64,
}
