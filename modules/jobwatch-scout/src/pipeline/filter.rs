//! Posting filters.
//!
//! Pure decision functions for each stage, composed by `FilterChain` in a
//! fixed order. The chain stops at the first rejection, so title exclusion
//! runs before any time parsing.

use tracing::{debug, warn};

use jobwatch_common::{FilterContext, JobPosting, RejectionReason, RepostCheck};

use crate::traits::PageSession;

const REPOST_MARKERS: [&str; 2] = ["repost", "relist"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(RejectionReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    Title,
    Recency,
    Repost,
}

// ---------------------------------------------------------------------------
// Pure decision functions
// ---------------------------------------------------------------------------

/// Reject when the lower-cased title contains an excluded term. `terms` must
/// already be lower-case; the first match in slice order is reported.
pub fn title_check(title: &str, terms: &[String]) -> Option<RejectionReason> {
    let title = title.to_lowercase();
    terms
        .iter()
        .find(|term| title.contains(term.as_str()))
        .map(|term| RejectionReason::TitleExcluded { term: term.clone() })
}

/// Reject postings older than the threshold, judged on the age the
/// extractor already parsed. A posting exactly at the threshold passes.
/// A posting whose time text did not parse is a rejection, not an error.
pub fn recency_check(posting: &JobPosting, threshold_secs: u64) -> Option<RejectionReason> {
    match posting.time_posted_seconds {
        Some(seconds) if seconds > threshold_secs => Some(RejectionReason::TooOld { seconds }),
        Some(_) => None,
        None => Some(RejectionReason::MalformedTimeText {
            text: posting.time_posted_raw.clone(),
        }),
    }
}

pub fn has_repost_marker(text: &str) -> bool {
    let text = text.to_lowercase();
    REPOST_MARKERS.iter().any(|marker| text.contains(marker))
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FilterChain {
    context: FilterContext,
    stages: Vec<FilterStage>,
}

impl FilterChain {
    pub fn new(context: FilterContext) -> Self {
        let mut stages = vec![FilterStage::Title, FilterStage::Recency];
        if context.repost_check != RepostCheck::Disabled {
            stages.push(FilterStage::Repost);
        }
        Self { context, stages }
    }

    pub fn context(&self) -> &FilterContext {
        &self.context
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    /// Run every stage in order, stopping at the first rejection. `session`
    /// is only touched by the repost stage.
    pub async fn evaluate(&self, posting: &JobPosting, session: &dyn PageSession) -> Verdict {
        for stage in &self.stages {
            let rejection = match stage {
                FilterStage::Title => title_check(&posting.title, &self.context.title_exclude_terms),
                FilterStage::Recency => recency_check(posting, self.context.recency_threshold_secs),
                FilterStage::Repost => self.repost_stage(posting, session).await,
            };
            if let Some(reason) = rejection {
                return Verdict::Reject(reason);
            }
        }
        Verdict::Accept
    }

    /// Card time text carrying a repost marker never reaches this stage: it
    /// fails the recency grammar first. Only the posting page can reveal one.
    async fn repost_stage(
        &self,
        posting: &JobPosting,
        session: &dyn PageSession,
    ) -> Option<RejectionReason> {
        match session.posted_time_detail(&posting.link).await {
            Ok(Some(detail)) if has_repost_marker(&detail) => {
                Some(RejectionReason::Repost { text: detail })
            }
            Ok(Some(_)) => None,
            Ok(None) => {
                debug!(link = %posting.link, "Posting page has no posted-time text");
                None
            }
            Err(e) => {
                warn!(link = %posting.link, error = %e, "Posting page lookup failed, skipping repost check");
                None
            }
        }
    }
}

// ===========================================================================
// Unit tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{posting, MockSession};

    const REPOST_TEXTS: [&str; 3] = [
        "Reposted 5 minutes ago",
        "5 minutes ago (relisted)",
        "Relisted 5 minutes ago",
    ];

    fn context(repost_check: RepostCheck) -> FilterContext {
        FilterContext::builder()
            .recency_threshold_secs(3_600)
            .title_exclude_terms(vec!["manager".to_string(), "lead".to_string()])
            .repost_check(repost_check)
            .build()
    }

    fn terms(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    // --- title_check ---

    #[test]
    fn title_match_is_case_insensitive_substring() {
        assert_eq!(
            title_check("Senior Manager, Data", &terms(&["manager"])),
            Some(RejectionReason::TitleExcluded {
                term: "manager".to_string()
            })
        );
        assert_eq!(
            title_check("Teamleader Analytics", &terms(&["lead"])),
            Some(RejectionReason::TitleExcluded {
                term: "lead".to_string()
            })
        );
    }

    #[test]
    fn title_reports_first_term_in_configured_order() {
        let reason = title_check("Lead Manager", &terms(&["manager", "lead"]));
        assert_eq!(
            reason,
            Some(RejectionReason::TitleExcluded {
                term: "manager".to_string()
            })
        );
    }

    #[test]
    fn title_without_terms_passes() {
        assert_eq!(title_check("Data Scientist", &terms(&["manager"])), None);
        assert_eq!(title_check("Data Scientist", &[]), None);
    }

    // --- recency_check ---

    fn aged(time_posted: &str) -> JobPosting {
        posting("Data Scientist", time_posted, "https://example.com/1")
    }

    #[test]
    fn recency_boundary_is_inclusive() {
        assert_eq!(recency_check(&aged("60 minutes ago"), 3_600), None);
        assert_eq!(
            recency_check(&aged("3601 seconds ago"), 3_600),
            Some(RejectionReason::TooOld { seconds: 3_601 })
        );
    }

    #[test]
    fn recency_rejects_old_posting() {
        assert_eq!(
            recency_check(&aged("2 days ago"), 900),
            Some(RejectionReason::TooOld { seconds: 172_800 })
        );
    }

    #[test]
    fn recency_rejects_malformed_text() {
        assert_eq!(
            recency_check(&aged("Reposted 5 minutes ago"), 900),
            Some(RejectionReason::MalformedTimeText {
                text: "Reposted 5 minutes ago".to_string()
            })
        );
    }

    #[test]
    fn recency_uses_parsed_age_not_raw_text() {
        let mut p = aged("5 minutes ago");
        p.time_posted_seconds = Some(7_200);
        assert_eq!(
            recency_check(&p, 3_600),
            Some(RejectionReason::TooOld { seconds: 7_200 })
        );

        p.time_posted_seconds = None;
        assert_eq!(
            recency_check(&p, 3_600),
            Some(RejectionReason::MalformedTimeText {
                text: "5 minutes ago".to_string()
            })
        );
    }

    // --- repost markers ---

    #[test]
    fn repost_markers_are_case_insensitive() {
        assert!(has_repost_marker("Reposted 2 hours ago"));
        assert!(has_repost_marker("RELISTED"));
        assert!(!has_repost_marker("2 hours ago"));
    }

    // --- chain ---

    #[test]
    fn repost_stage_only_present_when_enabled() {
        assert_eq!(
            FilterChain::new(context(RepostCheck::Disabled)).stages(),
            &[FilterStage::Title, FilterStage::Recency]
        );
        assert_eq!(
            FilterChain::new(context(RepostCheck::DetailPage)).stages(),
            &[FilterStage::Title, FilterStage::Recency, FilterStage::Repost]
        );
    }

    #[tokio::test]
    async fn fresh_allowed_posting_is_accepted() {
        let chain = FilterChain::new(context(RepostCheck::Disabled));
        let p = posting("Data Scientist", "5 minutes ago", "https://example.com/1");
        assert_eq!(chain.evaluate(&p, &MockSession::empty()).await, Verdict::Accept);
    }

    #[tokio::test]
    async fn title_reason_wins_over_recency() {
        let chain = FilterChain::new(context(RepostCheck::Disabled));
        let p = posting("Data Manager", "banana", "https://example.com/1");
        assert_eq!(
            chain.evaluate(&p, &MockSession::empty()).await,
            Verdict::Reject(RejectionReason::TitleExcluded {
                term: "manager".to_string()
            })
        );
    }

    #[tokio::test]
    async fn recency_reason_wins_over_repost() {
        let chain = FilterChain::new(context(RepostCheck::DetailPage));
        let session = MockSession::empty().with_detail("https://example.com/1", "Reposted 3 weeks ago");
        let p = posting("Data Scientist", "3 weeks ago", "https://example.com/1");
        assert_eq!(
            chain.evaluate(&p, &session).await,
            Verdict::Reject(RejectionReason::TooOld { seconds: 1_814_400 })
        );
        assert_eq!(session.detail_lookups(), 0);
    }

    #[tokio::test]
    async fn detail_page_repost_is_rejected() {
        let chain = FilterChain::new(context(RepostCheck::DetailPage));
        let session = MockSession::empty().with_detail("https://example.com/1", "Reposted 10 minutes ago");
        let p = posting("Data Scientist", "10 minutes ago", "https://example.com/1");
        assert_eq!(
            chain.evaluate(&p, &session).await,
            Verdict::Reject(RejectionReason::Repost {
                text: "Reposted 10 minutes ago".to_string()
            })
        );
    }

    #[tokio::test]
    async fn disabled_mode_never_fetches_detail_page() {
        let chain = FilterChain::new(context(RepostCheck::Disabled));
        let session = MockSession::empty().with_detail("https://example.com/1", "Reposted 10 minutes ago");
        let p = posting("Data Scientist", "10 minutes ago", "https://example.com/1");
        assert_eq!(chain.evaluate(&p, &session).await, Verdict::Accept);
        assert_eq!(session.detail_lookups(), 0);
    }

    #[tokio::test]
    async fn repost_marker_on_card_is_malformed_time_in_every_mode() {
        for mode in [RepostCheck::Disabled, RepostCheck::DetailPage] {
            let chain = FilterChain::new(context(mode));
            for text in REPOST_TEXTS {
                let session = MockSession::empty();
                let p = posting("Data Scientist", text, "https://example.com/1");
                assert_eq!(
                    chain.evaluate(&p, &session).await,
                    Verdict::Reject(RejectionReason::MalformedTimeText {
                        text: text.to_string()
                    }),
                    "{mode:?} / {text}"
                );
                assert_eq!(session.detail_lookups(), 0);
            }
        }
    }

    #[tokio::test]
    async fn failed_detail_lookup_falls_back_to_accept() {
        let chain = FilterChain::new(context(RepostCheck::DetailPage));
        let session = MockSession::empty().failing_details();
        let p = posting("Data Scientist", "10 minutes ago", "https://example.com/1");
        assert_eq!(chain.evaluate(&p, &session).await, Verdict::Accept);
        assert_eq!(session.detail_lookups(), 1);
    }
}
