pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, PageAgentKind, StorageTarget};
pub use error::{ExtractionCause, ExtractionFailure, JobWatchError};
pub use types::*;
