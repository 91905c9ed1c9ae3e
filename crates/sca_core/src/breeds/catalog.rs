//! Catalog contracts and the TTL cache.

use log::debug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

pub const DEFAULT_BREED_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// One catalog entry. Unknown upstream fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breed {
    pub id: String,
    pub name: String,
}

impl Breed {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Case-insensitive match on either id or display name.
    fn matches(&self, needle: &str) -> bool {
        self.id.to_lowercase() == needle || self.name.to_lowercase() == needle
    }
}

/// Errors raised while fetching the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreedCatalogError {
    /// Network or client setup failure.
    Transport(String),
    /// Upstream answered with a non-success status.
    UpstreamStatus(u16),
    /// Upstream body could not be decoded.
    Decode(String),
}

impl Display for BreedCatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "breed catalog unreachable: {message}"),
            Self::UpstreamStatus(status) => write!(f, "breed catalog returned status {status}"),
            Self::Decode(message) => write!(f, "breed catalog response invalid: {message}"),
        }
    }
}

impl Error for BreedCatalogError {}

/// Raw breed provider, called on every cache miss.
pub trait BreedSource {
    fn fetch_breeds(&self) -> Result<Vec<Breed>, BreedCatalogError>;
}

impl<S: BreedSource + ?Sized> BreedSource for Box<S> {
    fn fetch_breeds(&self) -> Result<Vec<Breed>, BreedCatalogError> {
        (**self).fetch_breeds()
    }
}

/// Catalog contract consumed by the cat service.
pub trait BreedCatalog {
    fn list_breeds(&self) -> Result<Vec<Breed>, BreedCatalogError>;

    /// Returns whether `name_or_id` names a known breed (trimmed,
    /// case-insensitive).
    fn validate_breed(&self, name_or_id: &str) -> Result<bool, BreedCatalogError> {
        let needle = name_or_id.trim().to_lowercase();
        Ok(self.list_breeds()?.iter().any(|breed| breed.matches(&needle)))
    }
}

/// Fixed in-process breed list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticBreedSource {
    breeds: Vec<Breed>,
}

impl StaticBreedSource {
    pub fn new(breeds: Vec<Breed>) -> Self {
        Self { breeds }
    }

    /// Small built-in list for offline use.
    pub fn builtin() -> Self {
        Self::new(vec![
            Breed::new("abys", "Abyssinian"),
            Breed::new("beng", "Bengal"),
            Breed::new("mcoo", "Maine Coon"),
            Breed::new("pers", "Persian"),
            Breed::new("siam", "Siamese"),
            Breed::new("sphy", "Sphynx"),
        ])
    }
}

impl BreedSource for StaticBreedSource {
    fn fetch_breeds(&self) -> Result<Vec<Breed>, BreedCatalogError> {
        Ok(self.breeds.clone())
    }
}

struct CachedBreeds {
    expires_at: Instant,
    breeds: Vec<Breed>,
}

/// Read-through cache with a fixed time-to-live.
///
/// Concurrent misses may each hit the source once; the last fetch wins.
pub struct CachedBreedCatalog<S: BreedSource> {
    source: S,
    ttl: Duration,
    cache: RwLock<Option<CachedBreeds>>,
}

impl<S: BreedSource> CachedBreedCatalog<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cache: RwLock::new(None),
        }
    }

    fn cached(&self, now: Instant) -> Option<Vec<Breed>> {
        let guard = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|entry| now < entry.expires_at)
            .map(|entry| entry.breeds.clone())
    }
}

impl<S: BreedSource> BreedCatalog for CachedBreedCatalog<S> {
    fn list_breeds(&self) -> Result<Vec<Breed>, BreedCatalogError> {
        if let Some(breeds) = self.cached(Instant::now()) {
            return Ok(breeds);
        }

        let breeds = self.source.fetch_breeds()?;
        debug!(
            "event=breed_cache_refresh module=breeds status=ok count={} ttl_secs={}",
            breeds.len(),
            self.ttl.as_secs()
        );
        let mut guard = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(CachedBreeds {
            expires_at: Instant::now() + self.ttl,
            breeds: breeds.clone(),
        });
        Ok(breeds)
    }
}
