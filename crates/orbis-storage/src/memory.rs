use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use orbis_core::error::Result;
use orbis_core::{
    Catalog, CatalogTransaction, CountryFilter, CountryRecord, GdpRank, NewCountry, SortOrder,
};
use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Rows keyed by lower-cased country name, mirroring a case-insensitive
/// unique index.
type Rows = BTreeMap<String, CountryRecord>;

#[derive(Debug, Default)]
struct Shared {
    rows: RwLock<Rows>,
    writer: Arc<Mutex<()>>,
}

/// In-memory implementation of the catalog.
///
/// Writers are serialized: a transaction owns the writer lock from
/// [`Catalog::begin`] until it is committed, rolled back or dropped, and
/// deletes queue behind it. Readers never wait for a writer and only see
/// committed rows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    shared: Arc<Shared>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Case folding shared with [`CountryFilter::matches`].
fn key(name: &str) -> String {
    name.to_lowercase()
}

/// Orders a missing estimate below every number.
fn cmp_gdp(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.total_cmp(&b),
    }
}

fn compare(sort: SortOrder, a: &CountryRecord, b: &CountryRecord) -> Ordering {
    match sort {
        SortOrder::GdpAsc => cmp_gdp(a.estimated_gdp, b.estimated_gdp),
        SortOrder::GdpDesc => cmp_gdp(b.estimated_gdp, a.estimated_gdp),
        SortOrder::NameAsc => key(&a.name).cmp(&key(&b.name)),
        SortOrder::NameDesc => key(&b.name).cmp(&key(&a.name)),
        SortOrder::PopulationAsc => a.population.cmp(&b.population),
        SortOrder::PopulationDesc => b.population.cmp(&a.population),
    }
}

fn top_by_gdp(rows: &Rows, limit: usize) -> Vec<GdpRank> {
    let mut ranked: Vec<&CountryRecord> = rows.values().collect();
    ranked.sort_by(|a, b| compare(SortOrder::GdpDesc, a, b));
    ranked.into_iter().take(limit).map(GdpRank::from).collect()
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> Result<InMemoryTransaction> {
        let writer = Arc::clone(&self.shared.writer).lock_owned().await;
        let staged = self.shared.rows.read().clone();

        Ok(InMemoryTransaction {
            shared: Arc::clone(&self.shared),
            staged,
            _writer: writer,
        })
    }

    async fn list(
        &self,
        filter: &CountryFilter,
        sort: Option<SortOrder>,
    ) -> Result<Vec<CountryRecord>> {
        let mut records: Vec<CountryRecord> = self
            .shared
            .rows
            .read()
            .values()
            .filter(|r| filter.matches(r.region.as_deref(), r.currency_code.as_deref()))
            .cloned()
            .collect();

        if let Some(sort) = sort {
            records.sort_by(|a, b| compare(sort, a, b));
        }

        Ok(records)
    }

    async fn get(&self, name: &str) -> Result<Option<CountryRecord>> {
        Ok(self.shared.rows.read().get(&key(name)).cloned())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let _writer = self.shared.writer.lock().await;
        Ok(self.shared.rows.write().remove(&key(name)).is_some())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.shared.rows.read().len() as u64)
    }
}

/// A staged copy of the catalog that replaces the committed rows on commit.
pub struct InMemoryTransaction {
    shared: Arc<Shared>,
    staged: Rows,
    _writer: OwnedMutexGuard<()>,
}

#[async_trait]
impl CatalogTransaction for InMemoryTransaction {
    async fn upsert(&mut self, record: &NewCountry) -> Result<()> {
        let key = key(&record.name);
        let mut stored = record.clone().into_record(Timestamp::now());

        // The unique key is case-insensitive; an update keeps the stored spelling.
        if let Some(existing) = self.staged.get(&key) {
            stored.name = existing.name.clone();
        }

        self.staged.insert(key, stored);
        Ok(())
    }

    async fn count(&mut self) -> Result<u64> {
        Ok(self.staged.len() as u64)
    }

    async fn top_by_gdp(&mut self, limit: usize) -> Result<Vec<GdpRank>> {
        Ok(top_by_gdp(&self.staged, limit))
    }

    async fn commit(self) -> Result<()> {
        *self.shared.rows.write() = self.staged;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
