use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::ExtractionCause;

// --- Postings ---

/// One job listing extracted from a results page.
///
/// Only the extractor builds these, and only after every text field was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    /// Absolute URL of the posting. Used as the de-duplication key downstream.
    pub link: String,
    /// Verbatim "N unit ago" text as shown on the card.
    pub time_posted_raw: String,
    /// `time_posted_raw` in seconds. `None` when the text does not parse;
    /// such postings never survive the recency filter.
    pub time_posted_seconds: Option<u64>,
}

/// The row handed to persistence sinks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostingRecord {
    pub timestamp: DateTime<Local>,
    pub title: String,
    pub company: String,
    pub location: String,
    pub link: String,
}

pub const RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl PostingRecord {
    pub fn new(posting: &JobPosting, timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            title: posting.title.clone(),
            company: posting.company.clone(),
            location: posting.location.clone(),
            link: posting.link.clone(),
        }
    }

    /// Column order shared by every persistence sink.
    pub fn columns() -> [&'static str; 5] {
        ["timestamp", "job_title", "company", "location", "link"]
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.format(RECORD_TIMESTAMP_FORMAT).to_string(),
            self.title.clone(),
            self.company.clone(),
            self.location.clone(),
            self.link.clone(),
        ]
    }
}

// --- Filter configuration ---

/// Result ordering requested from the listings page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    MostRecent,
    Relevance,
}

impl SortOrder {
    pub fn query_value(&self) -> &'static str {
        match self {
            SortOrder::MostRecent => "DD",
            SortOrder::Relevance => "R",
        }
    }
}

/// How (and whether) repost/relist detection runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepostCheck {
    #[default]
    Disabled,
    /// Fetch the posting page and inspect its "posted ... ago" text.
    DetailPage,
}

/// Per-run filter configuration.
#[derive(Debug, Clone, TypedBuilder)]
pub struct FilterContext {
    pub recency_threshold_secs: u64,
    /// Lower-cased, de-duplicated, blank terms dropped.
    #[builder(default, setter(transform = |terms: Vec<String>| normalize_terms(terms)))]
    pub title_exclude_terms: Vec<String>,
    #[builder(default)]
    pub sort_order: SortOrder,
    #[builder(default)]
    pub repost_check: RepostCheck,
}

pub fn normalize_terms(terms: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(terms.len());
    for term in terms {
        let term = term.trim().to_lowercase();
        if !term.is_empty() && !out.contains(&term) {
            out.push(term);
        }
    }
    out
}

// --- Discovery outcome ---

/// Why a candidate did not make it into the accepted set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    Extraction(ExtractionCause),
    TitleExcluded { term: String },
    TooOld { seconds: u64 },
    MalformedTimeText { text: String },
    /// The posting page's posted-time text carried a repost marker.
    Repost { text: String },
}

impl RejectionReason {
    /// Short machine-friendly tag for structured logs.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Extraction(_) => "extraction_failure",
            Self::TitleExcluded { .. } => "title_excluded",
            Self::TooOld { .. } => "too_old",
            Self::MalformedTimeText { .. } => "malformed_time_text",
            Self::Repost { .. } => "repost",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extraction(cause) => write!(f, "extraction failed: {cause}"),
            Self::TitleExcluded { term } => write!(f, "title contains excluded term {term:?}"),
            Self::TooOld { seconds } => write!(f, "posted {seconds}s ago"),
            Self::MalformedTimeText { text } => write!(f, "unparseable time text {text:?}"),
            Self::Repost { text } => write!(f, "reposted, posting page says {text:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub candidate_index: usize,
    pub reason: RejectionReason,
}

/// Accepted postings in page order plus a log of every rejected candidate.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryResult {
    /// Number of listing handles the page returned.
    pub candidates: usize,
    pub accepted: Vec<JobPosting>,
    pub rejections: Vec<Rejection>,
}

impl DiscoveryResult {
    pub fn extraction_failures(&self) -> usize {
        self.rejections
            .iter()
            .filter(|r| matches!(r.reason, RejectionReason::Extraction(_)))
            .count()
    }
}

/// Formatting hint for notification sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageFormat {
    PlainText,
    #[default]
    RichText,
}
