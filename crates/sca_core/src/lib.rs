//! Core domain logic for the spy cat dispatch agency.
//! This crate is the single source of truth for mission and assignment
//! invariants; transports only translate requests and errors.

pub mod breeds;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod rules;
pub mod service;

pub use breeds::{
    Breed, BreedCatalog, BreedCatalogError, CachedBreedCatalog, HttpBreedSource,
    StaticBreedSource,
};
pub use config::{ConfigError, DispatchConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings};
pub use model::cat::{Cat, CatId, NewCat};
pub use model::completion::Completion;
pub use model::mission::{
    Mission, MissionId, Target, TargetDraft, TargetId, TargetUpdate, MAX_TARGETS_PER_MISSION,
};
pub use repo::cat_repo::{CatRepository, SqliteCatRepository};
pub use repo::mission_repo::{AppendOutcome, MissionRepository, SqliteMissionRepository};
pub use repo::{RepoError, RepoResult};
pub use service::assignment::AssignmentCoordinator;
pub use service::cat_service::{CatService, CatServiceError};
pub use service::error::{EntityRef, ErrorCategory, MissionServiceError};
pub use service::mission_service::{MissionResult, MissionService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
