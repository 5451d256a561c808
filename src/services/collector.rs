use std::time::Duration;

use crate::config::Config;
use crate::db::{InsertOutcome, Repository};
use crate::error::Result;
use crate::models::CanonicalItem;
use crate::sources::{ListingSource, RssSource, SourceAdapter};

use super::canonicalize::{canonicalize, sort_newest_first};

/// Counts reported by one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub collected: usize,
    pub added: usize,
    pub skipped: usize,
}

/// Runs all source adapters sequentially, canonicalizes their output and
/// writes the deduplicated batch to the store.
pub struct Collector {
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl Collector {
    pub fn new(adapters: Vec<Box<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    pub fn from_config(config: &Config) -> Self {
        let delay = Duration::from_millis(config.fetch_delay_ms);

        let mut adapters: Vec<Box<dyn SourceAdapter>> = Vec::new();
        for feed_url in &config.feeds {
            adapters.push(Box::new(RssSource::new(feed_url.clone())));
        }
        for listing in &config.listings {
            adapters.push(Box::new(ListingSource::new(listing, delay)));
        }

        Self::new(adapters)
    }

    /// Fetch and canonicalize everything. A failing adapter contributes zero
    /// items; the run continues.
    pub async fn collect(&self) -> Vec<CanonicalItem> {
        let mut items = Vec::new();

        for adapter in &self.adapters {
            match adapter.list_raw_records().await {
                Ok(batch) => {
                    tracing::info!(
                        "{}: collected {} records",
                        batch.source,
                        batch.records.len()
                    );
                    items.extend(
                        batch
                            .records
                            .iter()
                            .map(|r| canonicalize(r, &batch.source, &batch.feed_url)),
                    );
                }
                Err(e) => {
                    tracing::warn!("Source {} failed, contributing 0 items: {}", adapter.label(), e);
                }
            }
        }

        sort_newest_first(&mut items);
        items
    }

    /// Insert-if-absent for the whole batch. Re-running over overlapping
    /// source data is idempotent; store failures stay item-local.
    pub async fn ingest(&self, repo: &Repository, items: Vec<CanonicalItem>) -> Result<IngestReport> {
        let mut report = IngestReport {
            collected: items.len(),
            ..Default::default()
        };

        for item in items {
            let uid = item.uid.clone();
            match repo.insert_if_absent(item).await {
                Ok(InsertOutcome::Added) => report.added += 1,
                Ok(InsertOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!("Insert failed for {}: {}", uid, e);
                }
            }
        }

        tracing::info!(
            "Ingestion pass: added {}, skipped {} (already existed)",
            report.added,
            report.skipped
        );
        Ok(report)
    }

    pub async fn run(&self, repo: &Repository) -> Result<IngestReport> {
        let items = self.collect().await;
        self.ingest(repo, items).await
    }
}
