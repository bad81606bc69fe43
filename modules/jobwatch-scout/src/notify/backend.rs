use async_trait::async_trait;

use jobwatch_common::{JobWatchError, MessageFormat};

/// Pluggable notification backend.
#[async_trait]
pub trait NotifyBackend: Send + Sync {
    /// Deliver one already-rendered message. Failures are `Delivery` errors.
    async fn send(
        &self,
        destination: &str,
        message: &str,
        format: MessageFormat,
    ) -> Result<(), JobWatchError>;

    fn name(&self) -> &str;
}
