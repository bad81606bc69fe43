use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobWatchError {
    #[error("Malformed time text: {0:?}")]
    MalformedTimeText(String),

    #[error("Page agent error: {0}")]
    PageAgent(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Why a listing card could not be turned into a posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionCause {
    /// No element matched any selector for the field.
    MissingField(&'static str),
    /// The element was found but its text was blank.
    EmptyField(&'static str),
    MissingAttribute {
        field: &'static str,
        attribute: &'static str,
    },
    /// The link is not an absolute http(s) URL.
    InvalidLink(String),
}

impl fmt::Display for ExtractionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing {field}"),
            Self::EmptyField(field) => write!(f, "empty {field}"),
            Self::MissingAttribute { field, attribute } => {
                write!(f, "{field} has no {attribute} attribute")
            }
            Self::InvalidLink(link) => write!(f, "link is not an absolute URL: {link:?}"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Extraction failed for listing {listing_index}: {cause}")]
pub struct ExtractionFailure {
    pub listing_index: usize,
    pub cause: ExtractionCause,
}
