use async_trait::async_trait;
use tracing::info;

use jobwatch_common::{JobWatchError, PostingRecord};

use super::backend::PostingStore;

/// Logs instead of writing. Used for dry runs.
pub struct NoopStore;

#[async_trait]
impl PostingStore for NoopStore {
    async fn append(&self, record: &PostingRecord) -> Result<(), JobWatchError> {
        info!(link = %record.link, "Dry run, record not stored");
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}
