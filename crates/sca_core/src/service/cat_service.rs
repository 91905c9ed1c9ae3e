//! Cat use-case service.
//!
//! # Responsibility
//! - Validate and create cats, checking the breed against the catalog.
//! - Provide read, salary update and delete operations.
//!
//! # Invariants
//! - Breed is checked once, at creation; later catalog changes do not
//!   affect existing cats.
//! - An unreachable catalog is reported distinctly from an unknown breed.
//! - A cat referenced by any mission cannot be deleted.

use crate::breeds::{Breed, BreedCatalog, BreedCatalogError};
use crate::model::cat::{Cat, CatId, NewCat};
use crate::repo::cat_repo::CatRepository;
use crate::repo::RepoError;
use crate::service::error::ErrorCategory;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MIN_CAT_NAME_CHARS: usize = 2;

/// Errors from cat use-cases.
#[derive(Debug)]
pub enum CatServiceError {
    InvalidField {
        field: &'static str,
        reason: String,
    },
    /// Breed is not in the catalog.
    InvalidBreed(String),
    /// Catalog could not be consulted.
    BreedCatalogUnavailable(BreedCatalogError),
    CatNotFound(CatId),
    /// Cat is still referenced by a mission.
    CatInUse(CatId),
    /// Store/infrastructure failure.
    Repo(RepoError),
}

impl CatServiceError {
    /// Stable machine-readable identifier.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidField { .. } => "invalid_field",
            Self::InvalidBreed(_) => "invalid_breed",
            Self::BreedCatalogUnavailable(_) => "breed_catalog_unavailable",
            Self::CatNotFound(_) => "not_found",
            Self::CatInUse(_) => "cat_in_use",
            Self::Repo(_) => "store_unavailable",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidField { .. } | Self::InvalidBreed(_) => ErrorCategory::Invalid,
            Self::CatNotFound(_) => ErrorCategory::NotFound,
            Self::CatInUse(_) => ErrorCategory::Conflict,
            Self::BreedCatalogUnavailable(_) | Self::Repo(_) => ErrorCategory::Unavailable,
        }
    }
}

impl Display for CatServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidField { field, reason } => write!(f, "invalid `{field}`: {reason}"),
            Self::InvalidBreed(breed) => write!(f, "invalid breed: `{breed}`"),
            Self::BreedCatalogUnavailable(err) => write!(f, "{err}"),
            Self::CatNotFound(id) => write!(f, "cat {id} not found"),
            Self::CatInUse(id) => write!(f, "cat {id} is referenced by a mission"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::BreedCatalogUnavailable(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CatServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Cat service facade over a repository and a breed catalog.
pub struct CatService<R: CatRepository, B: BreedCatalog> {
    repo: R,
    breeds: B,
}

impl<R: CatRepository, B: BreedCatalog> CatService<R, B> {
    pub fn new(repo: R, breeds: B) -> Self {
        Self { repo, breeds }
    }

    /// Validates fields and breed, then persists a new cat.
    pub fn create_cat(&self, cat: &NewCat) -> Result<Cat, CatServiceError> {
        let name = cat.name.trim();
        if name.chars().count() < MIN_CAT_NAME_CHARS {
            return Err(CatServiceError::InvalidField {
                field: "name",
                reason: format!("must be at least {MIN_CAT_NAME_CHARS} characters"),
            });
        }
        if cat.years_of_experience < 0 {
            return Err(CatServiceError::InvalidField {
                field: "years_of_experience",
                reason: "must not be negative".to_string(),
            });
        }
        validate_salary(cat.salary_cents)?;
        let breed = cat.breed.trim();
        if breed.is_empty() {
            return Err(CatServiceError::InvalidField {
                field: "breed",
                reason: "must not be blank".to_string(),
            });
        }

        match self.breeds.validate_breed(breed) {
            Ok(true) => {}
            Ok(false) => return Err(CatServiceError::InvalidBreed(breed.to_string())),
            Err(err) => {
                warn!(
                    "event=cat_create module=cat status=error error_code=breed_catalog_unavailable error={err}"
                );
                return Err(CatServiceError::BreedCatalogUnavailable(err));
            }
        }

        let normalized = NewCat {
            name: name.to_string(),
            years_of_experience: cat.years_of_experience,
            breed: breed.to_string(),
            salary_cents: cat.salary_cents,
        };
        let created = self.repo.create_cat(Uuid::new_v4(), &normalized)?;
        info!("event=cat_create module=cat status=ok cat_id={}", created.id);
        Ok(created)
    }

    pub fn get_cat(&self, id: CatId) -> Result<Cat, CatServiceError> {
        self.repo
            .get_cat(id)?
            .ok_or(CatServiceError::CatNotFound(id))
    }

    pub fn list_cats(&self) -> Result<Vec<Cat>, CatServiceError> {
        Ok(self.repo.list_cats()?)
    }

    /// Replaces the salary; the only mutable cat attribute.
    pub fn update_salary(&self, id: CatId, salary_cents: i64) -> Result<Cat, CatServiceError> {
        validate_salary(salary_cents)?;
        if self.repo.update_salary(id, salary_cents)? == 0 {
            return Err(CatServiceError::CatNotFound(id));
        }
        info!("event=cat_salary_update module=cat status=ok cat_id={id}");
        self.get_cat(id)
    }

    pub fn delete_cat(&self, id: CatId) -> Result<(), CatServiceError> {
        let deleted = match self.repo.delete_cat(id) {
            Ok(deleted) => deleted,
            Err(RepoError::ReferenceViolation(_)) => {
                warn!("event=cat_delete module=cat status=rejected cat_id={id} error_code=cat_in_use");
                return Err(CatServiceError::CatInUse(id));
            }
            Err(err) => return Err(err.into()),
        };
        if deleted == 0 {
            let err = match self.repo.get_cat(id)? {
                Some(_) => CatServiceError::CatInUse(id),
                None => CatServiceError::CatNotFound(id),
            };
            warn!(
                "event=cat_delete module=cat status=rejected cat_id={id} error_code={}",
                err.code()
            );
            return Err(err);
        }
        info!("event=cat_delete module=cat status=ok cat_id={id}");
        Ok(())
    }

    pub fn list_breeds(&self) -> Result<Vec<Breed>, CatServiceError> {
        self.breeds
            .list_breeds()
            .map_err(CatServiceError::BreedCatalogUnavailable)
    }
}

fn validate_salary(salary_cents: i64) -> Result<(), CatServiceError> {
    if salary_cents < 0 {
        return Err(CatServiceError::InvalidField {
            field: "salary_cents",
            reason: "must not be negative".to_string(),
        });
    }
    Ok(())
}
