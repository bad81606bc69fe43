// Trait boundaries between the discovery pipeline and the page it reads.
//
// PageAgent hands out one PageSession per cycle. A session turns a search
// query into listing handles and can look up a posting's own page. The
// pipeline never sees HTML, browsers or HTTP; tests swap in the mocks from
// `crate::testing`.

use std::collections::HashMap;

use async_trait::async_trait;

use jobwatch_common::JobWatchError;

use crate::pipeline::query::SearchQuery;

/// Snapshot of one element found inside a listing card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementHandle {
    text: String,
    attributes: HashMap<String, String>,
}

impl ElementHandle {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// One listing card on a results page.
pub trait ListingHandle: Send + Sync {
    /// First element matching a CSS selector, if any.
    fn find(&self, selector: &str) -> Option<ElementHandle>;
}

#[async_trait]
pub trait PageSession: Send + Sync {
    /// Listing cards for a query, top to bottom as the page shows them.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Box<dyn ListingHandle>>, JobWatchError>;

    /// The "posted ... ago" text from a posting's own page, which carries the
    /// repost/relist marker the card omits.
    async fn posted_time_detail(&self, link: &str) -> Result<Option<String>, JobWatchError>;

    /// Release the session. Safe to call more than once.
    async fn close(&self);
}

#[async_trait]
pub trait PageAgent: Send + Sync {
    /// Acquire a fresh session. At most one session is open at a time.
    async fn open(&self) -> Result<Box<dyn PageSession>, JobWatchError>;
}
