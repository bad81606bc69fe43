//! One discovery pass: query → listing handles → extract → filter.

use tracing::{debug, info, warn};

use jobwatch_common::{DiscoveryResult, JobWatchError, Rejection, RejectionReason};

use crate::pipeline::extractor::ListingExtractor;
use crate::pipeline::filter::{FilterChain, Verdict};
use crate::pipeline::query::{QueryBuilder, SearchQuery};
use crate::traits::PageSession;

pub struct DiscoveryRun {
    query_builder: QueryBuilder,
    extractor: ListingExtractor,
    filters: FilterChain,
    job_title: String,
    location: String,
}

impl DiscoveryRun {
    pub fn new(
        query_builder: QueryBuilder,
        extractor: ListingExtractor,
        filters: FilterChain,
        job_title: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            query_builder,
            extractor,
            filters,
            job_title: job_title.into(),
            location: location.into(),
        }
    }

    /// The query this run issues. The recency window equals the filter's
    /// threshold so the page and the filter agree on "recent".
    pub fn query(&self) -> SearchQuery {
        let context = self.filters.context();
        self.query_builder.build(
            &self.job_title,
            &self.location,
            context.recency_threshold_secs,
            context.sort_order,
        )
    }

    /// Process every listing in page order. Extraction failures and filter
    /// rejections are recorded and skipped; only the page agent failing to
    /// return listings at all is an error.
    pub async fn run(&self, session: &dyn PageSession) -> Result<DiscoveryResult, JobWatchError> {
        let query = self.query();
        debug!(url = %query.url(), "Searching listings");

        let listings = session.search(&query).await?;
        let mut result = DiscoveryResult {
            candidates: listings.len(),
            ..Default::default()
        };

        if listings.is_empty() {
            info!("No listings on page");
            return Ok(result);
        }

        for (index, listing) in listings.iter().enumerate() {
            let posting = match self.extractor.extract(index, listing.as_ref()) {
                Ok(posting) => posting,
                Err(failure) => {
                    warn!(candidate = index, cause = %failure.cause, "Listing extraction failed");
                    result.rejections.push(Rejection {
                        candidate_index: index,
                        reason: RejectionReason::Extraction(failure.cause),
                    });
                    continue;
                }
            };

            match self.filters.evaluate(&posting, session).await {
                Verdict::Accept => {
                    info!(
                        candidate = index,
                        title = %posting.title,
                        company = %posting.company,
                        time_posted = %posting.time_posted_raw,
                        "Posting accepted"
                    );
                    result.accepted.push(posting);
                }
                Verdict::Reject(reason) => {
                    info!(
                        candidate = index,
                        title = %posting.title,
                        reason = reason.tag(),
                        detail = %reason,
                        "Posting rejected"
                    );
                    result.rejections.push(Rejection {
                        candidate_index: index,
                        reason,
                    });
                }
            }
        }

        info!(
            candidates = result.candidates,
            accepted = result.accepted.len(),
            rejected = result.rejections.len(),
            extraction_failures = result.extraction_failures(),
            "Discovery complete"
        );

        Ok(result)
    }
}
