//! CLI error envelope and exit-code mapping.

use sca_core::{
    BreedCatalogError, CatServiceError, ConfigError, DbError, ErrorCategory,
    MissionServiceError, RepoError,
};
use serde_json::json;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Logging(String),
    Store(DbError),
    Repo(RepoError),
    Catalog(BreedCatalogError),
    Cat(CatServiceError),
    Mission(MissionServiceError),
    BadArgument { field: &'static str, reason: String },
    Output(serde_json::Error),
}

impl CliError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "invalid_config",
            Self::Logging(_) => "logging_unavailable",
            Self::Store(_) | Self::Repo(_) => "store_unavailable",
            Self::Catalog(_) => "breed_catalog_unavailable",
            Self::Cat(err) => err.code(),
            Self::Mission(err) => err.code(),
            Self::BadArgument { .. } => "invalid_argument",
            Self::Output(_) => "output_failed",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::BadArgument { .. } => ErrorCategory::Invalid,
            Self::Cat(err) => err.category(),
            Self::Mission(err) => err.category(),
            Self::Logging(_)
            | Self::Store(_)
            | Self::Repo(_)
            | Self::Catalog(_)
            | Self::Output(_) => ErrorCategory::Unavailable,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self.category() {
            ErrorCategory::Invalid => 2,
            ErrorCategory::NotFound => 3,
            ErrorCategory::Conflict => 4,
            ErrorCategory::Unavailable => 5,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "error": self.code(),
            "category": self.category().as_str(),
            "message": self.to_string(),
        })
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(message) => write!(f, "{message}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Cat(err) => write!(f, "{err}"),
            Self::Mission(err) => write!(f, "{err}"),
            Self::BadArgument { field, reason } => write!(f, "invalid `{field}`: {reason}"),
            Self::Output(err) => write!(f, "failed to render output: {err}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Store(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<BreedCatalogError> for CliError {
    fn from(value: BreedCatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<CatServiceError> for CliError {
    fn from(value: CatServiceError) -> Self {
        Self::Cat(value)
    }
}

impl From<MissionServiceError> for CliError {
    fn from(value: MissionServiceError) -> Self {
        Self::Mission(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}

#[cfg(test)]
mod tests {
    use super::CliError;
    use sca_core::{EntityRef, MissionServiceError};
    use uuid::Uuid;

    #[test]
    fn exit_codes_follow_category() {
        let not_found: CliError =
            MissionServiceError::NotFound(EntityRef::Mission(Uuid::nil())).into();
        assert_eq!(not_found.exit_code(), 3);

        let conflict: CliError = MissionServiceError::AssignmentConflict {
            mission_id: Uuid::nil(),
            cat_id: Uuid::nil(),
        }
        .into();
        assert_eq!(conflict.exit_code(), 4);

        let invalid = CliError::BadArgument {
            field: "target",
            reason: "missing country".to_string(),
        };
        assert_eq!(invalid.exit_code(), 2);
    }

    #[test]
    fn json_envelope_carries_code_and_category() {
        let err: CliError = MissionServiceError::InvalidMutation.into();
        let body = err.to_json();
        assert_eq!(body["error"], "invalid_mutation");
        assert_eq!(body["category"], "invalid");
        assert!(body["message"].as_str().unwrap().contains("notes"));
    }
}
