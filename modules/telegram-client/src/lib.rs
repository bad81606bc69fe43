pub mod error;

pub use error::{Result, TelegramError};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram `parse_mode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
    MarkdownV2,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
    disable_web_page_preview: bool,
}

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

pub struct TelegramClient {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl TelegramClient {
    pub fn new(bot_token: &str) -> Result<Self> {
        Self::with_api_base(DEFAULT_API_BASE, bot_token)
    }

    /// Point the client at a different Bot API server (self-hosted or test).
    pub fn with_api_base(api_base: &str, bot_token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| TelegramError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    /// Send a text message to a chat. Link previews are disabled.
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<()> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode,
            disable_web_page_preview: true,
        };

        debug!(chat_id, chars = text.len(), "Sending Telegram message");

        let resp = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let raw = resp.text().await?;
        let parsed: Option<ApiResponse> = serde_json::from_str(&raw).ok();

        if status.as_u16() == 429 {
            let retry_after = parsed
                .as_ref()
                .and_then(|r| r.parameters.as_ref())
                .and_then(|p| p.retry_after)
                .unwrap_or(1);
            return Err(TelegramError::RateLimited { retry_after });
        }

        match parsed {
            Some(api) if status.is_success() && api.ok => Ok(()),
            Some(api) => Err(TelegramError::Api {
                status: status.as_u16(),
                message: api.description.unwrap_or(raw),
            }),
            None => Err(TelegramError::Api {
                status: status.as_u16(),
                message: raw,
            }),
        }
    }
}
