use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tracing::{info, info_span, warn, Instrument};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use jobwatch_common::{JobPosting, JobWatchError, MessageFormat, PostingRecord};

use crate::notify::{render, NotifyBackend};
use crate::pipeline::DiscoveryRun;
use crate::store::PostingStore;
use crate::traits::{PageAgent, PageSession};

use super::jitter::JitteredInterval;
use super::stats::CycleStats;

pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Holds the running flag for one cycle and clears it on drop, including
/// when the cycle panics or its future is dropped.
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs discovery cycles and hands accepted postings to the sinks.
#[derive(TypedBuilder)]
pub struct CycleScheduler {
    agent: Arc<dyn PageAgent>,
    notifier: Arc<dyn NotifyBackend>,
    store: Arc<dyn PostingStore>,
    /// Chat id (or equivalent) messages are sent to.
    #[builder(setter(into))]
    destination: String,
    #[builder(default)]
    format: MessageFormat,
    discovery: DiscoveryRun,
    interval: JitteredInterval,
    #[builder(default = DEFAULT_STARTUP_DELAY)]
    startup_delay: Duration,
    #[builder(default, setter(skip))]
    running: AtomicBool,
}

impl CycleScheduler {
    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::SeqCst) {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    pub fn next_delay(&self) -> Duration {
        self.interval.next_delay()
    }

    /// Run one cycle: open a session, discover, deliver each accepted
    /// posting in order, close the session. Never fails; problems are
    /// logged and counted in the returned stats.
    pub async fn run_cycle(&self) -> CycleStats {
        let run_id = Uuid::new_v4();

        let Some(_running) = RunningGuard::acquire(&self.running) else {
            warn!(%run_id, "Previous cycle still running, skipping");
            let mut stats = CycleStats::new(run_id);
            stats.aborted = true;
            stats.skipped = true;
            return stats;
        };

        let stats = self
            .cycle(run_id)
            .instrument(info_span!("cycle", %run_id))
            .await;

        info!("{stats}");
        stats
    }

    async fn cycle(&self, run_id: Uuid) -> CycleStats {
        let mut stats = CycleStats::new(run_id);

        let session = match self.agent.open().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Could not open page session");
                stats.aborted = true;
                return stats;
            }
        };

        let result = self.discover_and_deliver(session.as_ref(), &mut stats).await;

        // Always release the session
        session.close().await;

        if let Err(e) = result {
            warn!(error = %e, "Cycle aborted");
            stats.aborted = true;
        }
        stats
    }

    async fn discover_and_deliver(
        &self,
        session: &dyn PageSession,
        stats: &mut CycleStats,
    ) -> Result<(), JobWatchError> {
        let result = self.discovery.run(session).await?;

        stats.candidates = result.candidates;
        stats.accepted = result.accepted.len();
        stats.rejected = result.rejections.len();
        stats.extraction_failures = result.extraction_failures();

        for posting in &result.accepted {
            self.deliver(posting, stats).await;
        }
        Ok(())
    }

    /// Notify, then persist. A failure in one sink does not skip the other.
    async fn deliver(&self, posting: &JobPosting, stats: &mut CycleStats) {
        let message = render(posting, self.format);
        match self
            .notifier
            .send(&self.destination, &message, self.format)
            .await
        {
            Ok(()) => stats.notified += 1,
            Err(e) => {
                warn!(link = %posting.link, notifier = self.notifier.name(), error = %e, "Notification failed");
                stats.notify_failures += 1;
            }
        }

        let record = PostingRecord::new(posting, Local::now());
        match self.store.append(&record).await {
            Ok(()) => {
                stats.stored += 1;
                info!(title = %posting.title, company = %posting.company, "Posting saved");
            }
            Err(e) => {
                warn!(link = %posting.link, store = self.store.name(), error = %e, "Persisting posting failed");
                stats.store_failures += 1;
            }
        }
    }

    /// Cycle until `shutdown` resolves. The first cycle starts after the
    /// startup delay; a cycle already running is allowed to finish.
    pub async fn run_forever<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut delay = self.startup_delay;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping scheduler");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            self.run_cycle().await;

            delay = self.next_delay();
            info!(delay_secs = delay.as_secs(), "Next cycle scheduled");
        }
    }
}
