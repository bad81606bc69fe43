pub mod error;

pub use error::{BrowserlessError, Result};

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

/// Per-request rendering options for the `/content` endpoint.
#[derive(Debug, Clone, Default)]
pub struct ContentOptions {
    /// Block until this CSS selector is present in the rendered DOM.
    pub wait_for_selector: Option<String>,
    /// How long Browserless may wait for `wait_for_selector`.
    pub wait_timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentRequest<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    wait_for_selector: Option<WaitForSelector<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_agent: Option<&'a str>,
}

#[derive(Serialize)]
struct WaitForSelector<'a> {
    selector: &'a str,
    timeout: u64,
}

const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BrowserlessError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        })
    }

    fn content_endpoint(&self) -> String {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }

    /// Fetch fully-rendered HTML content for a URL via Browserless /content endpoint.
    pub async fn content(&self, url: &str) -> Result<String> {
        self.content_with(url, &ContentOptions::default()).await
    }

    /// Like [`content`](Self::content), but waits for a selector and/or
    /// overrides the browser user agent before the DOM is dumped.
    pub async fn content_with(&self, url: &str, options: &ContentOptions) -> Result<String> {
        let body = ContentRequest {
            url,
            wait_for_selector: options.wait_for_selector.as_deref().map(|selector| {
                WaitForSelector {
                    selector,
                    timeout: options
                        .wait_timeout
                        .unwrap_or(DEFAULT_WAIT_TIMEOUT)
                        .as_millis() as u64,
                }
            }),
            user_agent: options.user_agent.as_deref(),
        };

        debug!(url, "Requesting rendered content from Browserless");

        let resp = self
            .client
            .post(self.content_endpoint())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}
