use scraper::{ElementRef, Html, Selector};

use jobwatch_common::JobWatchError;

use crate::traits::{ElementHandle, ListingHandle};

/// One listing card, kept as its HTML fragment. `scraper::Html` is not
/// `Send`, so the fragment is re-parsed on each lookup.
#[derive(Debug, Clone)]
pub struct HtmlListing {
    fragment: String,
}

impl HtmlListing {
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
        }
    }
}

impl ListingHandle for HtmlListing {
    fn find(&self, selector: &str) -> Option<ElementHandle> {
        let selector = Selector::parse(selector).ok()?;
        let document = Html::parse_fragment(&self.fragment);
        let element = document.select(&selector).next()?;
        Some(to_handle(element))
    }
}

fn to_handle(element: ElementRef<'_>) -> ElementHandle {
    element
        .value()
        .attrs()
        .fold(ElementHandle::new(collapsed_text(element)), |handle, (name, value)| {
            handle.with_attribute(name, value)
        })
}

/// Text content with runs of whitespace folded to single spaces.
fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_selector(selector: &str) -> Result<Selector, JobWatchError> {
    Selector::parse(selector)
        .map_err(|e| JobWatchError::Config(format!("invalid CSS selector {selector:?}: {e}")))
}

/// Split a results page into its listing cards, in document order.
pub fn split_cards(html: &str, card_selector: &str) -> Result<Vec<HtmlListing>, JobWatchError> {
    let selector = parse_selector(card_selector)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .map(|card| HtmlListing::new(card.html()))
        .collect())
}

/// Collapsed text of the first element matching `selector`, if non-blank.
pub fn first_text(html: &str, selector: &str) -> Result<Option<String>, JobWatchError> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .next()
        .map(collapsed_text)
        .filter(|text| !text.is_empty()))
}
