mod listing;
mod rss;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::RawRecord;

pub use listing::ListingSource;
pub use rss::RssSource;

/// One source's contribution to an ingestion run.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub source: String,
    pub feed_url: String,
    pub records: Vec<RawRecord>,
}

/// A pluggable source of raw records: an RSS feed, a scraped listing page,
/// or a test double. Adapter failure means the source contributes zero items
/// for this run; it is never pipeline-fatal.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Label used in logs before the source name is known.
    fn label(&self) -> &str;

    async fn list_raw_records(&self) -> Result<SourceBatch>;
}
