use crate::country::{CountryRecord, GdpRank, NewCountry};
use crate::error::Result;
use crate::query::{CountryFilter, SortOrder};
use async_trait::async_trait;

/// Persistent store of [`CountryRecord`]s keyed by country name.
///
/// Reads always observe committed state. Writes issued by a refresh go
/// through a [`CatalogTransaction`] obtained from [`Catalog::begin`].
#[async_trait]
pub trait Catalog: Send + Sync + 'static {
    type Transaction: CatalogTransaction;

    /// Opens a transaction. The transaction holds one storage connection
    /// until it is committed, rolled back or dropped.
    async fn begin(&self) -> Result<Self::Transaction>;

    /// Lists countries matching `filter`, optionally ordered by `sort`.
    async fn list(
        &self,
        filter: &CountryFilter,
        sort: Option<SortOrder>,
    ) -> Result<Vec<CountryRecord>>;

    /// Retrieves the record for a given country name.
    /// Returns `None` if the country is not in the catalog.
    async fn get(&self, name: &str) -> Result<Option<CountryRecord>>;

    /// Deletes the record for a given country name.
    /// Returns `true` if the record existed and was removed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Number of committed rows.
    async fn count(&self) -> Result<u64>;
}

/// An open all-or-nothing unit of work against a [`Catalog`].
///
/// Dropping a transaction without calling [`CatalogTransaction::commit`]
/// discards every write made through it.
#[async_trait]
pub trait CatalogTransaction: Send + 'static {
    /// Inserts the record, or overwrites every mutable field of the existing
    /// record with the same name. Never deletes.
    async fn upsert(&mut self, record: &NewCountry) -> Result<()>;

    /// Row count as seen from inside the transaction.
    async fn count(&mut self) -> Result<u64>;

    /// Up to `limit` rows ordered by estimated GDP descending, missing
    /// estimates last, as seen from inside the transaction.
    async fn top_by_gdp(&mut self, limit: usize) -> Result<Vec<GdpRank>>;

    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}
