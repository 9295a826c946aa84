//! Pipeline orchestration
//!
//! Drives one full sync run: paginated fetch, structural validation,
//! business-rule filtering, aggregation, and the single full-replace
//! call to the sink. The run is strictly sequential and the sink is
//! never touched before every page has been fetched and every record
//! validated.

use crate::aggregate::EntityAggregator;
use crate::config::ProviderConfig;
use crate::fetch::{ContentFetcher, FetchError, fetch_all_packages};
use crate::sink::{EntitySink, FullReplaceBatch, SinkError};
use crate::validation::{ValidationError, is_eligible, validate_package};
use thiserror::Error;
use tracing::info;

/// Errors that abort a sync run before the sink is mutated.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Observability summary of one completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub packages_seen: usize,
    pub packages_eligible: usize,
    pub entities_emitted: usize,
}

/// One catalogue provider instance.
///
/// Assumes at most one run executing at a time: runs share no mutable
/// state, but overlapping runs would race on the sink's full-replace
/// call, which nothing here guards against. The surrounding scheduler
/// owns that constraint, along with any run-level timeout.
pub struct CatalogueProvider<F, S> {
    config: ProviderConfig,
    fetcher: F,
    sink: S,
}

impl<F: ContentFetcher, S: EntitySink> CatalogueProvider<F, S> {
    pub fn new(config: ProviderConfig, fetcher: F, sink: S) -> Self {
        Self {
            config,
            fetcher,
            sink,
        }
    }

    /// Execute one full sync run.
    ///
    /// A schema violation on any record or an exhausted page retry
    /// budget aborts the run with no partial mutation of the sink. All
    /// other conditions (naming collisions, untrusted hosts, failed
    /// definition fetches) degrade and are visible only in logs.
    pub async fn run(&self) -> Result<RunStats, SyncError> {
        let raw_records = fetch_all_packages(&self.fetcher, &self.config.base_url).await?;
        let packages_seen = raw_records.len();

        let mut aggregator = EntityAggregator::new(&self.config);
        let mut packages_eligible = 0usize;
        for raw in &raw_records {
            let package = validate_package(raw)?;
            if !is_eligible(&package) {
                continue;
            }
            packages_eligible += 1;
            aggregator.add_package(&package, &self.fetcher).await;
        }

        let entities = aggregator.finish().into_entities();
        let stats = RunStats {
            packages_seen,
            packages_eligible,
            entities_emitted: entities.len(),
        };

        let provider_name = self.config.provider_name();
        self.sink
            .apply(FullReplaceBatch {
                provider_name: provider_name.clone(),
                entities,
            })
            .await?;

        info!(
            provider = %provider_name,
            packages_seen = stats.packages_seen,
            packages_eligible = stats.packages_eligible,
            entities = stats.entities_emitted,
            "sync run complete"
        );
        Ok(stats)
    }
}
