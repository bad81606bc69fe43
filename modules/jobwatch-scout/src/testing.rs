// Test mocks for the discovery pipeline.
//
// One mock per trait boundary:
// - MockListing (ListingHandle): selector→element map
// - MockPageAgent / MockSession (PageAgent, PageSession): canned listings, shared counters
// - RecordingNotifier (NotifyBackend): records messages, optional failures
// - RecordingStore (PostingStore): records rows, optional failures
//
// Plus helpers for building full listing cards and postings.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use jobwatch_common::{JobPosting, JobWatchError, MessageFormat, PostingRecord};

use crate::notify::NotifyBackend;
use crate::pipeline::query::SearchQuery;
use crate::store::PostingStore;
use crate::traits::{ElementHandle, ListingHandle, PageAgent, PageSession};

/// Delivery events shared across recording sinks, e.g. `"notify:<link>"`.
pub type EventLog = Arc<Mutex<Vec<String>>>;

// ---------------------------------------------------------------------------
// MockListing
// ---------------------------------------------------------------------------

/// Selector-keyed listing card. Selectors are matched verbatim.
#[derive(Debug, Clone, Default)]
pub struct MockListing {
    elements: HashMap<String, ElementHandle>,
}

impl MockListing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the element at `selector` with a text-only element.
    pub fn with_text(mut self, selector: &str, text: &str) -> Self {
        self.elements
            .insert(selector.to_string(), ElementHandle::new(text));
        self
    }

    /// Set an attribute, creating an empty element if none exists yet.
    pub fn with_attr(mut self, selector: &str, name: &str, value: &str) -> Self {
        let element = self.elements.remove(selector).unwrap_or_default();
        self.elements
            .insert(selector.to_string(), element.with_attribute(name, value));
        self
    }

    pub fn without(mut self, selector: &str) -> Self {
        self.elements.remove(selector);
        self
    }
}

impl ListingHandle for MockListing {
    fn find(&self, selector: &str) -> Option<ElementHandle> {
        self.elements.get(selector).cloned()
    }
}

/// A complete card in the current layout.
pub fn card(title: &str, time_posted: &str, link: &str) -> MockListing {
    MockListing::new()
        .with_text("h3.base-search-card__title", title)
        .with_text("h4.base-search-card__subtitle", "Acme GmbH")
        .with_text("span.job-search-card__location", "Berlin, Germany")
        .with_attr("a.base-card__full-link", "href", link)
        .with_text("time.job-search-card__listdate--new", time_posted)
}

pub fn posting(title: &str, time_posted: &str, link: &str) -> JobPosting {
    JobPosting {
        title: title.to_string(),
        company: "Acme GmbH".to_string(),
        location: "Berlin, Germany".to_string(),
        link: link.to_string(),
        time_posted_raw: time_posted.to_string(),
        time_posted_seconds: crate::pipeline::time_ago::parse(time_posted).ok(),
    }
}

// ---------------------------------------------------------------------------
// MockSession
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SessionLog {
    searched: Mutex<Vec<String>>,
    detail_lookups: AtomicUsize,
    closes: AtomicUsize,
}

/// Canned page session. Clones share counters, so a test can keep one copy
/// while the scheduler owns another.
#[derive(Debug, Clone, Default)]
pub struct MockSession {
    listings: Vec<MockListing>,
    details: HashMap<String, String>,
    fail_search: bool,
    fail_details: bool,
    search_delay: Option<Duration>,
    log: Arc<SessionLog>,
}

impl MockSession {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_listings(listings: Vec<MockListing>) -> Self {
        Self {
            listings,
            ..Self::default()
        }
    }

    pub fn with_detail(mut self, link: &str, posted_time: &str) -> Self {
        self.details
            .insert(link.to_string(), posted_time.to_string());
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    pub fn failing_details(mut self) -> Self {
        self.fail_details = true;
        self
    }

    /// Hold every search for `delay` before answering.
    pub fn slow_search(mut self, delay: Duration) -> Self {
        self.search_delay = Some(delay);
        self
    }

    pub fn searched_urls(&self) -> Vec<String> {
        self.log.searched.lock().unwrap().clone()
    }

    pub fn detail_lookups(&self) -> usize {
        self.log.detail_lookups.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.log.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSession for MockSession {
    async fn search(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<Box<dyn ListingHandle>>, JobWatchError> {
        self.log
            .searched
            .lock()
            .unwrap()
            .push(query.url().to_string());
        if let Some(delay) = self.search_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_search {
            return Err(JobWatchError::PageAgent("results page timed out".to_string()));
        }
        Ok(self
            .listings
            .iter()
            .cloned()
            .map(|l| Box::new(l) as Box<dyn ListingHandle>)
            .collect())
    }

    async fn posted_time_detail(&self, link: &str) -> Result<Option<String>, JobWatchError> {
        self.log.detail_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_details {
            return Err(JobWatchError::PageAgent(format!("could not load {link}")));
        }
        Ok(self.details.get(link).cloned())
    }

    async fn close(&self) {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// MockPageAgent
// ---------------------------------------------------------------------------

/// Hands out clones of one `MockSession`.
pub struct MockPageAgent {
    session: MockSession,
    fail_open: bool,
    opens: AtomicUsize,
}

impl MockPageAgent {
    pub fn new(session: MockSession) -> Self {
        Self {
            session,
            fail_open: false,
            opens: AtomicUsize::new(0),
        }
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn session(&self) -> &MockSession {
        &self.session
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageAgent for MockPageAgent {
    async fn open(&self) -> Result<Box<dyn PageSession>, JobWatchError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(JobWatchError::PageAgent("browser unavailable".to_string()));
        }
        Ok(Box::new(self.session.clone()))
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub destination: String,
    pub message: String,
    pub format: MessageFormat,
}

/// Records every send. Calls whose zero-based index is in `fail_on` return
/// `Delivery` errors and are not recorded.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMessage>>,
    calls: AtomicUsize,
    fail_on: HashSet<usize>,
    events: Option<EventLog>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.fail_on = calls.iter().copied().collect();
        self
    }

    pub fn logging_to(mut self, events: EventLog) -> Self {
        self.events = Some(events);
        self
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotifyBackend for RecordingNotifier {
    async fn send(
        &self,
        destination: &str,
        message: &str,
        format: MessageFormat,
    ) -> Result<(), JobWatchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(events) = &self.events {
            events.lock().unwrap().push(format!("notify:{call}"));
        }
        if self.fail_on.contains(&call) {
            return Err(JobWatchError::Delivery(format!("send #{call} refused")));
        }
        self.sent.lock().unwrap().push(SentMessage {
            destination: destination.to_string(),
            message: message.to_string(),
            format,
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

// ---------------------------------------------------------------------------
// RecordingStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingStore {
    records: Mutex<Vec<PostingRecord>>,
    calls: AtomicUsize,
    fail_on: HashSet<usize>,
    events: Option<EventLog>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.fail_on = calls.iter().copied().collect();
        self
    }

    pub fn logging_to(mut self, events: EventLog) -> Self {
        self.events = Some(events);
        self
    }

    pub fn records(&self) -> Vec<PostingRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PostingStore for RecordingStore {
    async fn append(&self, record: &PostingRecord) -> Result<(), JobWatchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(events) = &self.events {
            events.lock().unwrap().push(format!("store:{call}"));
        }
        if self.fail_on.contains(&call) {
            return Err(JobWatchError::Write(format!("append #{call} refused")));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
