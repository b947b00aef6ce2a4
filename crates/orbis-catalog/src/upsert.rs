use orbis_core::{CatalogTransaction, GdpRank, NewCountry};
use tracing::debug;

use crate::error::Result;

/// Number of rows in the "top by estimated GDP" read-back.
pub const TOP_N: usize = 5;

/// Aggregates read back inside the refresh transaction, after every upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadBack {
    pub total: u64,
    pub top: Vec<GdpRank>,
}

/// Upserts the whole batch through `tx` and reads back the catalog size and
/// the top [`TOP_N`] rows by estimate.
///
/// Does not commit or roll back: the caller owns the transaction and must
/// roll it back if this returns an error.
pub async fn apply_batch<T: CatalogTransaction>(
    tx: &mut T,
    records: &[NewCountry],
) -> Result<ReadBack> {
    for record in records {
        tx.upsert(record).await?;
    }
    debug!(written = records.len(), "batch upserted");

    let total = tx.count().await?;
    let top = tx.top_by_gdp(TOP_N).await?;

    Ok(ReadBack { total, top })
}
