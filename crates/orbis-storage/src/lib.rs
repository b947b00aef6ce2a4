//! Storage backends for the country catalog.

pub mod memory;
pub mod mysql;

pub use memory::{InMemoryCatalog, InMemoryTransaction};
pub use mysql::{MySqlCatalog, MySqlTransaction};
pub use orbis_core::error::{Result, StorageError};
pub use orbis_core::{Catalog, CatalogTransaction};
