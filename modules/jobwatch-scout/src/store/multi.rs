use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use jobwatch_common::{JobWatchError, PostingRecord};

use super::backend::PostingStore;

/// Fans one record out to several stores. Every store is attempted even
/// when an earlier one fails; the failures are joined into one error.
pub struct MultiStore {
    stores: Vec<Arc<dyn PostingStore>>,
}

impl MultiStore {
    pub fn new(stores: Vec<Arc<dyn PostingStore>>) -> Self {
        Self { stores }
    }
}

#[async_trait]
impl PostingStore for MultiStore {
    async fn append(&self, record: &PostingRecord) -> Result<(), JobWatchError> {
        let mut failures = Vec::new();
        for store in &self.stores {
            if let Err(e) = store.append(record).await {
                warn!(store = store.name(), error = %e, "Store append failed");
                failures.push(format!("{}: {e}", store.name()));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(JobWatchError::Write(failures.join("; ")))
        }
    }

    fn name(&self) -> &str {
        "multi"
    }
}
