//! Page agents backed by fetched HTML.
//!
//! An `HtmlSource` turns a URL into markup (plain HTTP or a remote headless
//! browser). `HtmlPageAgent` wraps a source in the session discipline the
//! pipeline expects: one session at a time, released on close.

pub mod html;
pub mod sources;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use jobwatch_common::{Config, JobWatchError, PageAgentKind};

use crate::pipeline::extractor::CardSelectors;
use crate::pipeline::query::SearchQuery;
use crate::traits::{ListingHandle, PageAgent, PageSession};

pub use html::{first_text, split_cards, HtmlListing};
pub use sources::{BrowserlessSource, HttpFetcher};

#[async_trait]
pub trait HtmlSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
    fn name(&self) -> &str;
}

pub struct HtmlPageAgent {
    source: Arc<dyn HtmlSource>,
    card_selector: String,
    detail_selector: String,
    slot: Arc<Semaphore>,
}

impl HtmlPageAgent {
    pub fn new(source: Arc<dyn HtmlSource>, selectors: &CardSelectors) -> Self {
        Self {
            source,
            card_selector: selectors.card.clone(),
            detail_selector: selectors.detail_time_posted.clone(),
            slot: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn from_config(config: &Config, selectors: &CardSelectors) -> Result<Self, JobWatchError> {
        let source: Arc<dyn HtmlSource> = match &config.page_agent {
            PageAgentKind::Http => Arc::new(HttpFetcher::new()?),
            PageAgentKind::Browserless { url, token } => {
                Arc::new(BrowserlessSource::new(url, token.as_deref())?)
            }
        };
        Ok(Self::new(source, selectors))
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }
}

#[async_trait]
impl PageAgent for HtmlPageAgent {
    /// Waits while another session is still open.
    async fn open(&self) -> Result<Box<dyn PageSession>, JobWatchError> {
        let permit = self
            .slot
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| JobWatchError::PageAgent(format!("session slot unavailable: {e}")))?;
        debug!(source = self.source.name(), "Page session opened");
        Ok(Box::new(HtmlSession {
            source: self.source.clone(),
            card_selector: self.card_selector.clone(),
            detail_selector: self.detail_selector.clone(),
            permit: Mutex::new(Some(permit)),
            pages_fetched: AtomicUsize::new(0),
        }))
    }
}

pub struct HtmlSession {
    source: Arc<dyn HtmlSource>,
    card_selector: String,
    detail_selector: String,
    /// `None` once closed.
    permit: Mutex<Option<OwnedSemaphorePermit>>,
    pages_fetched: AtomicUsize,
}

impl HtmlSession {
    async fn fetch(&self, url: &str) -> Result<String, JobWatchError> {
        if self.permit.lock().await.is_none() {
            return Err(JobWatchError::PageAgent("session already closed".to_string()));
        }
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
        self.source
            .fetch(url)
            .await
            .map_err(|e| JobWatchError::PageAgent(format!("{} fetch of {url} failed: {e:#}", self.source.name())))
    }
}

#[async_trait]
impl PageSession for HtmlSession {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Box<dyn ListingHandle>>, JobWatchError> {
        let html = self.fetch(query.url().as_str()).await?;
        let cards = split_cards(&html, &self.card_selector)?;
        debug!(cards = cards.len(), bytes = html.len(), "Results page loaded");
        Ok(cards
            .into_iter()
            .map(|card| Box::new(card) as Box<dyn ListingHandle>)
            .collect())
    }

    async fn posted_time_detail(&self, link: &str) -> Result<Option<String>, JobWatchError> {
        let html = self.fetch(link).await?;
        first_text(&html, &self.detail_selector)
    }

    async fn close(&self) {
        if self.permit.lock().await.take().is_some() {
            debug!(
                source = self.source.name(),
                pages_fetched = self.pages_fetched.load(Ordering::Relaxed),
                "Page session closed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;
    use crate::pipeline::extractor::ListingExtractor;
    use crate::pipeline::query::{GeoLookup, QueryBuilder};
    use jobwatch_common::SortOrder;

    struct StaticHtml {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl HtmlSource for StaticHtml {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no page for {url}"))
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    const RESULTS: &str = r#"<ul>
        <li><div class="base-card base-search-card">
          <h3 class="base-search-card__title">Data Scientist</h3>
          <h4 class="base-search-card__subtitle"><a>Acme GmbH</a></h4>
          <span class="job-search-card__location">Berlin, Germany</span>
          <a class="base-card__full-link" href="https://jobs.example.com/view/1"></a>
          <time class="job-search-card__listdate">8 minutes ago</time>
        </div></li>
      </ul>"#;

    fn query() -> SearchQuery {
        QueryBuilder::new("https://jobs.example.com/search", GeoLookup::default())
            .unwrap()
            .build("Data Scientist", "Berlin", 900, SortOrder::MostRecent)
    }

    fn agent() -> HtmlPageAgent {
        let mut pages = HashMap::new();
        pages.insert(query().url().to_string(), RESULTS.to_string());
        pages.insert(
            "https://jobs.example.com/view/1".to_string(),
            r#"<span class="posted-time-ago__text">Reposted 8 minutes ago</span>"#.to_string(),
        );
        HtmlPageAgent::new(Arc::new(StaticHtml { pages }), &CardSelectors::default())
    }

    #[tokio::test]
    async fn search_yields_extractable_cards() {
        let session = agent().open().await.unwrap();
        let listings = session.search(&query()).await.unwrap();
        assert_eq!(listings.len(), 1);

        let posting = ListingExtractor::default()
            .extract(0, listings[0].as_ref())
            .unwrap();
        assert_eq!(posting.company, "Acme GmbH");
        assert_eq!(posting.time_posted_seconds, Some(480));
        session.close().await;
    }

    #[tokio::test]
    async fn detail_lookup_reads_posted_time() {
        let session = agent().open().await.unwrap();
        let detail = session
            .posted_time_detail("https://jobs.example.com/view/1")
            .await
            .unwrap();
        assert_eq!(detail.as_deref(), Some("Reposted 8 minutes ago"));
    }

    #[tokio::test]
    async fn fetch_failure_is_page_agent_error() {
        let session = agent().open().await.unwrap();
        let err = session
            .posted_time_detail("https://jobs.example.com/view/404")
            .await
            .unwrap_err();
        assert!(matches!(err, JobWatchError::PageAgent(_)));
    }

    #[tokio::test]
    async fn only_one_session_at_a_time() {
        let agent = agent();
        let first = agent.open().await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), agent.open()).await;
        assert!(blocked.is_err(), "second session opened while first was live");

        first.close().await;
        first.close().await;
        let second = tokio::time::timeout(Duration::from_millis(50), agent.open()).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn closed_session_refuses_work() {
        let session = agent().open().await.unwrap();
        session.close().await;
        assert!(matches!(
            session.search(&query()).await,
            Err(JobWatchError::PageAgent(_))
        ));
    }
}
