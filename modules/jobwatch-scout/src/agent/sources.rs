use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use tracing::{info, warn};

use browserless_client::{BrowserlessClient, ContentOptions};

use super::HtmlSource;

/// Desktop Chrome; the guest listings endpoint serves an empty page to
/// obvious bots.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const RENDER_WAIT: Duration = Duration::from_secs(10);

// --- Plain HTTP ---

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        info!("Using HttpFetcher");
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HtmlSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} for {}", status, url);
        }

        response.text().await.context("Failed to read response body")
    }

    fn name(&self) -> &str {
        "http"
    }
}

// --- Browserless ---

/// Renders pages in a remote headless Chrome.
pub struct BrowserlessSource {
    client: BrowserlessClient,
    options: ContentOptions,
}

impl BrowserlessSource {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        info!(base_url, "Using BrowserlessSource");
        let client = BrowserlessClient::new(base_url, token)
            .context("Failed to create Browserless client")?;
        Ok(Self {
            client,
            options: ContentOptions {
                wait_for_selector: Some("body".to_string()),
                wait_timeout: Some(RENDER_WAIT),
                user_agent: Some(BROWSER_USER_AGENT.to_string()),
            },
        })
    }
}

#[async_trait]
impl HtmlSource for BrowserlessSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        let html = self
            .client
            .content_with(url, &self.options)
            .await
            .context("Browserless content request failed")?;

        if html.trim().is_empty() {
            warn!(url, source = "browserless", "Empty HTML response");
        }
        Ok(html)
    }

    fn name(&self) -> &str {
        "browserless"
    }
}
