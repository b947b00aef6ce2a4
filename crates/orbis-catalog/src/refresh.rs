use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;
use orbis_core::{Catalog, CatalogTransaction, NewCountry};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use typed_builder::TypedBuilder;

use crate::artifact::{SummaryArtifact, SummaryReport};
use crate::error::{CatalogError, Result};
use crate::estimate::GdpEstimator;
use crate::fetcher::SourceFetcher;
use crate::state::RefreshState;
use crate::transform::transform_batch;
use crate::upsert::{apply_batch, ReadBack};

/// Stages a refresh moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStage {
    Fetching,
    Transforming,
    Upserting,
    Rendering,
    Committing,
}

impl Display for RefreshStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            RefreshStage::Fetching => "fetching",
            RefreshStage::Transforming => "transforming",
            RefreshStage::Upserting => "upserting",
            RefreshStage::Rendering => "rendering",
            RefreshStage::Committing => "committing",
        };
        f.write_str(stage)
    }
}

/// Result of a committed refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutcome {
    /// Entries in the upstream country listing, including skipped ones.
    pub records_fetched: usize,
    pub records_written: usize,
    pub skipped: usize,
    /// Catalog size after the commit.
    pub total: u64,
    pub refreshed_at: Timestamp,
}

/// A refresh that has written everything inside its open transaction and is
/// ready to commit.
struct Prepared<T> {
    tx: T,
    records_fetched: usize,
    records_written: usize,
    skipped: usize,
    read_back: ReadBack,
}

/// Runs the refresh pipeline: fetch, transform, upsert, read back, render,
/// commit, then publish the artifact and the refresh timestamp.
///
/// Refreshes are single-flight: a call made while another refresh is running
/// waits for it to finish and then runs its own.
#[derive(TypedBuilder)]
pub struct RefreshOrchestrator<C, F> {
    catalog: Arc<C>,
    fetcher: F,
    artifact: SummaryArtifact,
    #[builder(default)]
    estimator: GdpEstimator,
    #[builder(default)]
    state: RefreshState,
    /// Upper bound on everything up to and including the read-back and
    /// rendering; expiry rolls the transaction back.
    #[builder(default)]
    deadline: Option<Duration>,
    #[builder(default, setter(skip))]
    in_flight: Mutex<()>,
}

impl<C: Catalog, F: SourceFetcher> RefreshOrchestrator<C, F> {
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn artifact(&self) -> &SummaryArtifact {
        &self.artifact
    }

    pub fn state(&self) -> &RefreshState {
        &self.state
    }

    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let _in_flight = self.in_flight.lock().await;

        let prepared = match self.deadline {
            None => self.prepare().await?,
            Some(deadline) => match tokio::time::timeout(deadline, self.prepare()).await {
                Ok(prepared) => prepared?,
                Err(_) => {
                    // The dropped future took the open transaction with it.
                    warn!(?deadline, "refresh deadline exceeded, transaction rolled back");
                    // A staging write already handed to the blocking pool can still
                    // land after this. The next refresh overwrites the staging file
                    // before it publishes anything.
                    self.artifact.discard().await;
                    return Err(CatalogError::DeadlineExceeded(deadline));
                }
            },
        };

        self.commit(prepared).await
    }

    async fn prepare(&self) -> Result<Prepared<C::Transaction>> {
        debug!(stage = %RefreshStage::Fetching, "refresh started");
        let snapshot = self.fetcher.fetch().await?;
        let records_fetched = snapshot.countries.len();
        info!(
            records_fetched,
            rates = snapshot.rates.len(),
            "upstream sources fetched"
        );

        debug!(stage = %RefreshStage::Transforming, "transforming records");
        let batch = transform_batch(&snapshot.countries, &snapshot.rates, &self.estimator);

        let mut tx = self.catalog.begin().await?;
        let written = self.write(&mut tx, &batch.records).await;
        match written {
            Ok(read_back) => Ok(Prepared {
                tx,
                records_fetched,
                records_written: batch.records.len(),
                skipped: batch.skipped,
                read_back,
            }),
            Err((stage, err)) => {
                warn!(%stage, error = %err, "refresh failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    error!(error = %rollback_err, "rollback failed");
                }
                self.artifact.discard().await;
                Err(err)
            }
        }
    }

    /// Everything that happens inside the open transaction before commit.
    async fn write(
        &self,
        tx: &mut C::Transaction,
        records: &[NewCountry],
    ) -> std::result::Result<ReadBack, (RefreshStage, CatalogError)> {
        debug!(stage = %RefreshStage::Upserting, records = records.len(), "upserting batch");
        let read_back = apply_batch(tx, records)
            .await
            .map_err(|err| (RefreshStage::Upserting, err))?;

        debug!(stage = %RefreshStage::Rendering, total = read_back.total, "rendering summary");
        let report = SummaryReport::new(read_back.clone(), Timestamp::now());
        self.artifact
            .stage(&report)
            .await
            .map_err(|err| (RefreshStage::Rendering, err))?;

        Ok(read_back)
    }

    async fn commit(&self, prepared: Prepared<C::Transaction>) -> Result<RefreshOutcome> {
        debug!(stage = %RefreshStage::Committing, "committing refresh");
        if let Err(err) = prepared.tx.commit().await {
            warn!(error = %err, "commit failed");
            self.artifact.discard().await;
            return Err(err.into());
        }

        if let Err(err) = self.artifact.publish().await {
            warn!(
                path = %self.artifact.path().display(),
                error = %err,
                "summary image could not be published"
            );
        }

        let refreshed_at = Timestamp::now();
        self.state.publish(refreshed_at);

        info!(
            records_fetched = prepared.records_fetched,
            records_written = prepared.records_written,
            skipped = prepared.skipped,
            total = prepared.read_back.total,
            "refresh committed"
        );

        Ok(RefreshOutcome {
            records_fetched: prepared.records_fetched,
            records_written: prepared.records_written,
            skipped: prepared.skipped,
            total: prepared.read_back.total,
            refreshed_at,
        })
    }
}
