use async_trait::async_trait;

use jobwatch_common::{JobWatchError, PostingRecord};

/// Durable sink for accepted postings.
#[async_trait]
pub trait PostingStore: Send + Sync {
    /// Append one record. Failures are `Write` errors.
    async fn append(&self, record: &PostingRecord) -> Result<(), JobWatchError>;

    fn name(&self) -> &str;
}
