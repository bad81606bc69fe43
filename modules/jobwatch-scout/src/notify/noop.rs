use async_trait::async_trait;
use tracing::info;

use jobwatch_common::{JobWatchError, MessageFormat};

use super::backend::NotifyBackend;

/// Logs instead of sending. Used for dry runs.
pub struct NoopNotifier;

#[async_trait]
impl NotifyBackend for NoopNotifier {
    async fn send(
        &self,
        destination: &str,
        message: &str,
        _format: MessageFormat,
    ) -> Result<(), JobWatchError> {
        info!(destination, message, "Dry run, notification not sent");
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}
