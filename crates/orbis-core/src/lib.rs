//! Core types and traits for the Orbis country catalog.
//!
//! This crate provides the shared domain model and the storage contract
//! used by the refresh pipeline, the storage backends and the gateway.

pub mod country;
pub mod error;
pub mod query;
pub mod repository;

pub use country::{CountryRecord, GdpRank, NewCountry};
pub use error::StorageError;
pub use query::{CountryFilter, SortOrder, UnknownSortOrder};
pub use repository::{Catalog, CatalogTransaction};
