//! Country catalog service.
//!
//! This crate owns the refresh pipeline that rebuilds the catalog from two
//! upstream datasets (a country listing and a currency rate table) and the
//! [`CountryCatalog`] operations exposed to the HTTP layer.
//!
//! A refresh runs as:
//!
//! 1. [`fetcher`]: both upstream resources are fetched concurrently.
//! 2. [`transform`]: entries are normalized and given a GDP estimate.
//! 3. [`upsert`]: the batch is upserted in one transaction and the catalog
//!    size and top five by estimate are read back.
//! 4. [`artifact`]: the summary image is rendered and staged.
//! 5. [`refresh`]: commit, publish the image, record the refresh time.
//!
//! Any failure before the commit rolls the transaction back and leaves the
//! catalog, the published image and the refresh time untouched.

pub mod artifact;
pub mod error;
pub mod estimate;
pub mod fetcher;
pub mod refresh;
pub mod service;
pub mod state;
pub mod transform;
pub mod upsert;

pub use artifact::{SummaryArtifact, SummaryReport};
pub use error::{CatalogError, Result};
pub use estimate::{FixedMultiplier, GdpEstimator, MultiplierSource, ThreadRngMultiplier};
pub use fetcher::{HttpSourceFetcher, SourceEndpoints, SourceFetcher, SourceKind, SourceSnapshot};
pub use refresh::{RefreshOrchestrator, RefreshOutcome, RefreshStage};
pub use service::{CatalogService, CatalogStatus, CountryCatalog};
pub use state::RefreshState;
