use async_trait::async_trait;
use tracing::warn;

use jobwatch_common::{JobWatchError, MessageFormat};
use telegram_client::{ParseMode, TelegramClient, TelegramError};

use super::backend::NotifyBackend;

/// Telegram Bot API notification backend.
pub struct TelegramNotifier {
    client: TelegramClient,
}

impl TelegramNotifier {
    pub fn new(bot_token: &str) -> Result<Self, JobWatchError> {
        let client = TelegramClient::new(bot_token)
            .map_err(|e| JobWatchError::Config(format!("Telegram client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: TelegramClient) -> Self {
        Self { client }
    }

    fn parse_mode(format: MessageFormat) -> Option<ParseMode> {
        match format {
            MessageFormat::RichText => Some(ParseMode::Html),
            MessageFormat::PlainText => None,
        }
    }
}

#[async_trait]
impl NotifyBackend for TelegramNotifier {
    async fn send(
        &self,
        destination: &str,
        message: &str,
        format: MessageFormat,
    ) -> Result<(), JobWatchError> {
        self.client
            .send_message(destination, message, Self::parse_mode(format))
            .await
            .map_err(|e| {
                if let TelegramError::RateLimited { retry_after } = &e {
                    warn!(retry_after, "Telegram rate limit hit");
                }
                JobWatchError::Delivery(e.to_string())
            })
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
