//! Listing card → `JobPosting`.
//!
//! Every field is described by an ordered list of lookup strategies. The
//! first strategy that yields a non-blank value wins. Cards from the newer
//! page layout carry the posted time under a different class than older
//! ones, so the time field has two strategies, new layout first.

use tracing::debug;
use url::Url;

use jobwatch_common::{ExtractionCause, ExtractionFailure, JobPosting};

use crate::pipeline::time_ago;
use crate::traits::ListingHandle;

/// Where a field's value lives once its element is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    Text,
    Attribute(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldStrategy {
    pub selector: String,
    pub source: FieldSource,
}

impl FieldStrategy {
    pub fn text(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            source: FieldSource::Text,
        }
    }

    pub fn attribute(selector: &str, name: &'static str) -> Self {
        Self {
            selector: selector.to_string(),
            source: FieldSource::Attribute(name),
        }
    }
}

/// A named field and the strategies tried, in order, to read it.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    pub strategies: Vec<FieldStrategy>,
}

impl FieldRule {
    pub fn new(name: &'static str, strategies: Vec<FieldStrategy>) -> Self {
        Self { name, strategies }
    }
}

/// CSS selectors for a results page and its listing cards.
#[derive(Debug, Clone)]
pub struct CardSelectors {
    /// One match per listing card on the results page.
    pub card: String,
    pub title: FieldRule,
    pub company: FieldRule,
    pub location: FieldRule,
    pub link: FieldRule,
    pub time_posted: FieldRule,
    /// "Posted ... ago" element on a posting's own page.
    pub detail_time_posted: String,
}

impl Default for CardSelectors {
    fn default() -> Self {
        Self {
            card: "div.base-card.base-search-card".to_string(),
            title: FieldRule::new("title", vec![FieldStrategy::text("h3.base-search-card__title")]),
            company: FieldRule::new(
                "company",
                vec![FieldStrategy::text("h4.base-search-card__subtitle")],
            ),
            location: FieldRule::new(
                "location",
                vec![FieldStrategy::text("span.job-search-card__location")],
            ),
            link: FieldRule::new(
                "link",
                vec![FieldStrategy::attribute("a.base-card__full-link", "href")],
            ),
            time_posted: FieldRule::new(
                "time_posted",
                vec![
                    FieldStrategy::text("time.job-search-card__listdate--new"),
                    FieldStrategy::text("time.job-search-card__listdate"),
                ],
            ),
            detail_time_posted: "span.posted-time-ago__text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListingExtractor {
    selectors: CardSelectors,
}

impl ListingExtractor {
    pub fn new(selectors: CardSelectors) -> Self {
        Self { selectors }
    }

    /// Extract every field of one card, or report the first one missing.
    pub fn extract(
        &self,
        listing_index: usize,
        handle: &dyn ListingHandle,
    ) -> Result<JobPosting, ExtractionFailure> {
        let fail = |cause| ExtractionFailure {
            listing_index,
            cause,
        };

        let title = read_field(handle, &self.selectors.title).map_err(fail)?;
        let company = read_field(handle, &self.selectors.company).map_err(fail)?;
        let location = read_field(handle, &self.selectors.location).map_err(fail)?;
        let link = read_field(handle, &self.selectors.link).map_err(fail)?;
        if !is_absolute_http(&link) {
            return Err(fail(ExtractionCause::InvalidLink(link)));
        }
        let time_posted_raw = read_field(handle, &self.selectors.time_posted).map_err(fail)?;

        let time_posted_seconds = time_ago::parse(&time_posted_raw).ok();

        Ok(JobPosting {
            title,
            company,
            location,
            link,
            time_posted_raw,
            time_posted_seconds,
        })
    }
}

/// Try each strategy in order. Blank values and missing attributes fall
/// through to the next strategy; the first of those is reported if all fail.
fn read_field(handle: &dyn ListingHandle, rule: &FieldRule) -> Result<String, ExtractionCause> {
    let mut found_but_unusable: Option<ExtractionCause> = None;

    for (attempt, strategy) in rule.strategies.iter().enumerate() {
        let Some(element) = handle.find(&strategy.selector) else {
            if attempt + 1 < rule.strategies.len() {
                debug!(
                    field = rule.name,
                    selector = %strategy.selector,
                    "Selector missed, trying next layout"
                );
            }
            continue;
        };

        let value = match strategy.source {
            FieldSource::Text => Some(element.text().trim().to_string()),
            FieldSource::Attribute(name) => element.attribute(name).map(|v| v.trim().to_string()),
        };

        match value {
            Some(v) if !v.is_empty() => return Ok(v),
            Some(_) => {
                found_but_unusable.get_or_insert(ExtractionCause::EmptyField(rule.name));
            }
            None => {
                if let FieldSource::Attribute(attribute) = strategy.source {
                    found_but_unusable.get_or_insert(ExtractionCause::MissingAttribute {
                        field: rule.name,
                        attribute,
                    });
                }
            }
        }
    }

    Err(found_but_unusable.unwrap_or(ExtractionCause::MissingField(rule.name)))
}

fn is_absolute_http(link: &str) -> bool {
    Url::parse(link)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}
