//! Breed catalog used to validate cats at creation time.
//!
//! # Responsibility
//! - Define the catalog contract consumed by the cat service.
//! - Provide a time-bounded read-through cache over a breed source.
//!
//! # Invariants
//! - Cached breeds are served only until the TTL expires; the next read
//!   refreshes transparently.
//! - A failed refresh is reported as an error, never as "unknown breed".

mod catalog;
mod http;

pub use catalog::{
    Breed, BreedCatalog, BreedCatalogError, BreedSource, CachedBreedCatalog, StaticBreedSource,
    DEFAULT_BREED_CACHE_TTL,
};
pub use http::{HttpBreedSource, DEFAULT_BREED_API_BASE_URL};
