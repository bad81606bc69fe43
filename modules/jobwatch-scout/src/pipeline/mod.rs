pub mod discovery;
pub mod extractor;
pub mod filter;
pub mod query;
pub mod time_ago;

pub use discovery::DiscoveryRun;
pub use extractor::{CardSelectors, ListingExtractor};
pub use filter::{FilterChain, Verdict};
pub use query::{GeoLookup, QueryBuilder, SearchQuery};
