use async_trait::async_trait;
use jiff::Timestamp;
use orbis_core::{Catalog, CountryFilter, CountryRecord, SortOrder};
use serde::Serialize;
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::fetcher::SourceFetcher;
use crate::refresh::{RefreshOrchestrator, RefreshOutcome};

/// Snapshot returned by [`CountryCatalog::status`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStatus {
    pub total_countries: u64,
    /// `None` until a refresh has committed in this process.
    pub last_refreshed_at: Option<Timestamp>,
}

/// Operations the catalog exposes to the surrounding service layer.
#[async_trait]
pub trait CountryCatalog: Send + Sync + 'static {
    /// Refetches both upstream sources and replaces the catalog contents.
    async fn refresh(&self) -> Result<RefreshOutcome>;

    async fn list(
        &self,
        filter: CountryFilter,
        sort: Option<SortOrder>,
    ) -> Result<Vec<CountryRecord>>;

    /// Returns [`CatalogError::NotFound`] if no country has this name.
    async fn get(&self, name: &str) -> Result<CountryRecord>;

    /// Returns [`CatalogError::NotFound`] if no country has this name.
    async fn delete(&self, name: &str) -> Result<()>;

    async fn status(&self) -> Result<CatalogStatus>;

    /// PNG bytes of the last published summary image.
    async fn summary_image(&self) -> Result<Vec<u8>>;
}

/// A concrete implementation of the [`CountryCatalog`] trait.
///
/// Reads go straight to the catalog; refreshes go through the wrapped
/// [`RefreshOrchestrator`].
pub struct CatalogService<C, F> {
    refresher: RefreshOrchestrator<C, F>,
}

impl<C: Catalog, F: SourceFetcher> CatalogService<C, F> {
    pub fn new(refresher: RefreshOrchestrator<C, F>) -> Self {
        Self { refresher }
    }
}

#[async_trait]
impl<C: Catalog, F: SourceFetcher> CountryCatalog for CatalogService<C, F> {
    async fn refresh(&self) -> Result<RefreshOutcome> {
        self.refresher.refresh().await
    }

    async fn list(
        &self,
        filter: CountryFilter,
        sort: Option<SortOrder>,
    ) -> Result<Vec<CountryRecord>> {
        debug!(?filter, sort = ?sort.map(|s| s.as_str()), "listing countries");
        Ok(self.refresher.catalog().list(&filter, sort).await?)
    }

    async fn get(&self, name: &str) -> Result<CountryRecord> {
        self.refresher
            .catalog()
            .get(name)
            .await?
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    async fn delete(&self, name: &str) -> Result<()> {
        if self.refresher.catalog().delete(name).await? {
            debug!(name, "country deleted");
            Ok(())
        } else {
            Err(CatalogError::NotFound(name.to_string()))
        }
    }

    async fn status(&self) -> Result<CatalogStatus> {
        Ok(CatalogStatus {
            total_countries: self.refresher.catalog().count().await?,
            last_refreshed_at: self.refresher.state().last_refreshed_at(),
        })
    }

    async fn summary_image(&self) -> Result<Vec<u8>> {
        self.refresher.artifact().read().await
    }
}
