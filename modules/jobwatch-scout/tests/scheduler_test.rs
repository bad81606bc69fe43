//! Integration test: CycleScheduler delivery and session lifecycle.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use jobwatch_common::{FilterContext, MessageFormat};
use jobwatch_scout::pipeline::{DiscoveryRun, FilterChain, GeoLookup, ListingExtractor, QueryBuilder};
use jobwatch_scout::scheduling::{CycleScheduler, JitteredInterval, SchedulerState};
use jobwatch_scout::testing::{
    card, EventLog, MockPageAgent, MockSession, RecordingNotifier, RecordingStore,
};

fn discovery() -> DiscoveryRun {
    let context = FilterContext::builder()
        .recency_threshold_secs(900)
        .title_exclude_terms(vec!["manager".to_string()])
        .build();
    DiscoveryRun::new(
        QueryBuilder::new("https://jobs.example.com/search", GeoLookup::default()).unwrap(),
        ListingExtractor::default(),
        FilterChain::new(context),
        "Data Scientist",
        "Berlin",
    )
}

fn three_fresh() -> MockSession {
    MockSession::with_listings(vec![
        card("One", "1 minute ago", "https://example.com/1"),
        card("Two", "2 minutes ago", "https://example.com/2"),
        card("Three", "3 minutes ago", "https://example.com/3"),
    ])
}

fn scheduler(
    agent: Arc<MockPageAgent>,
    notifier: Arc<RecordingNotifier>,
    store: Arc<RecordingStore>,
) -> CycleScheduler {
    CycleScheduler::builder()
        .agent(agent)
        .notifier(notifier)
        .store(store)
        .destination("chat-42")
        .discovery(discovery())
        .interval(JitteredInterval::new(900))
        .startup_delay(Duration::ZERO)
        .build()
}

#[tokio::test]
async fn store_failure_does_not_block_later_notifications() {
    let agent = Arc::new(MockPageAgent::new(three_fresh()));
    let notifier = Arc::new(RecordingNotifier::new());
    let store = Arc::new(RecordingStore::new().failing_on(&[1]));

    let stats = scheduler(agent.clone(), notifier.clone(), store.clone())
        .run_cycle()
        .await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 3);
    assert!(sent[0].message.contains("One"));
    assert!(sent[2].message.contains("Three"));
    assert!(sent.iter().all(|m| m.destination == "chat-42"));
    assert!(sent.iter().all(|m| m.format == MessageFormat::RichText));

    let stored: Vec<_> = store.records().into_iter().map(|r| r.title).collect();
    assert_eq!(stored, ["One", "Three"]);
    assert_eq!(stats.notified, 3);
    assert_eq!(stats.stored, 2);
    assert_eq!(stats.store_failures, 1);
    assert!(!stats.aborted);
}

#[tokio::test]
async fn notification_failure_still_persists() {
    let agent = Arc::new(MockPageAgent::new(three_fresh()));
    let notifier = Arc::new(RecordingNotifier::new().failing_on(&[0]));
    let store = Arc::new(RecordingStore::new());

    let stats = scheduler(agent, notifier.clone(), store.clone())
        .run_cycle()
        .await;

    assert_eq!(notifier.sent().len(), 2);
    assert_eq!(store.records().len(), 3);
    assert_eq!(stats.notify_failures, 1);
}

#[tokio::test]
async fn each_posting_is_notified_before_it_is_stored() {
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let agent = Arc::new(MockPageAgent::new(three_fresh()));
    let notifier = Arc::new(RecordingNotifier::new().logging_to(events.clone()));
    let store = Arc::new(RecordingStore::new().logging_to(events.clone()));

    scheduler(agent, notifier, store).run_cycle().await;

    assert_eq!(
        *events.lock().unwrap(),
        ["notify:0", "store:0", "notify:1", "store:1", "notify:2", "store:2"]
    );
}

#[tokio::test]
async fn session_closed_after_successful_cycle() {
    let agent = Arc::new(MockPageAgent::new(three_fresh()));
    let scheduler = scheduler(
        agent.clone(),
        Arc::new(RecordingNotifier::new()),
        Arc::new(RecordingStore::new()),
    );

    scheduler.run_cycle().await;

    assert_eq!(agent.open_count(), 1);
    assert_eq!(agent.session().close_count(), 1);
    assert_eq!(scheduler.state(), SchedulerState::Idle);
}

#[tokio::test]
async fn session_closed_when_search_fails() {
    let agent = Arc::new(MockPageAgent::new(three_fresh().failing_search()));
    let notifier = Arc::new(RecordingNotifier::new());
    let scheduler = scheduler(agent.clone(), notifier.clone(), Arc::new(RecordingStore::new()));

    let stats = scheduler.run_cycle().await;

    assert!(stats.aborted);
    assert_eq!(agent.session().close_count(), 1);
    assert!(notifier.sent().is_empty());
    assert_eq!(scheduler.state(), SchedulerState::Idle);
}

#[tokio::test]
async fn failed_open_aborts_cycle_and_returns_to_idle() {
    let agent = Arc::new(MockPageAgent::new(three_fresh()).failing_open());
    let scheduler = scheduler(
        agent.clone(),
        Arc::new(RecordingNotifier::new()),
        Arc::new(RecordingStore::new()),
    );

    let stats = scheduler.run_cycle().await;

    assert!(stats.aborted);
    assert_eq!(agent.session().close_count(), 0);
    assert_eq!(scheduler.state(), SchedulerState::Idle);

    // The next cycle is attempted normally.
    scheduler.run_cycle().await;
    assert_eq!(agent.open_count(), 2);
}

#[tokio::test]
async fn overlapping_cycle_is_skipped() {
    let agent = Arc::new(MockPageAgent::new(
        three_fresh().slow_search(Duration::from_millis(300)),
    ));
    let notifier = Arc::new(RecordingNotifier::new());
    let scheduler = scheduler(agent.clone(), notifier.clone(), Arc::new(RecordingStore::new()));

    let (first, second) = tokio::join!(scheduler.run_cycle(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(scheduler.state(), SchedulerState::Running);
        scheduler.run_cycle().await
    });

    assert!(!first.aborted);
    assert_eq!(first.notified, 3);
    assert!(second.aborted);
    assert!(second.skipped);
    assert_eq!(agent.open_count(), 1);
    assert_eq!(notifier.sent().len(), 3);
    assert_eq!(scheduler.state(), SchedulerState::Idle);

    // Once the first cycle is done the next one runs normally.
    let third = scheduler.run_cycle().await;
    assert!(!third.skipped);
    assert_eq!(agent.open_count(), 2);
}

#[tokio::test]
async fn postings_are_redelivered_on_every_cycle() {
    let agent = Arc::new(MockPageAgent::new(three_fresh()));
    let notifier = Arc::new(RecordingNotifier::new());
    let scheduler = scheduler(agent, notifier.clone(), Arc::new(RecordingStore::new()));

    let first = scheduler.run_cycle().await;
    let second = scheduler.run_cycle().await;

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(notifier.sent().len(), 6);
}

#[tokio::test]
async fn run_forever_stops_on_shutdown() {
    let agent = Arc::new(MockPageAgent::new(three_fresh()));
    let scheduler = scheduler(
        agent.clone(),
        Arc::new(RecordingNotifier::new()),
        Arc::new(RecordingStore::new()),
    );

    // The first cycle starts immediately; the next is at least 890s away.
    scheduler
        .run_forever(tokio::time::sleep(Duration::from_millis(200)))
        .await;

    assert_eq!(agent.open_count(), 1);
    assert_eq!(scheduler.state(), SchedulerState::Idle);
}

#[tokio::test]
async fn ready_shutdown_runs_no_cycle() {
    let agent = Arc::new(MockPageAgent::new(three_fresh()));
    let scheduler = CycleScheduler::builder()
        .agent(agent.clone())
        .notifier(Arc::new(RecordingNotifier::new()))
        .store(Arc::new(RecordingStore::new()))
        .destination("chat-42")
        .discovery(discovery())
        .interval(JitteredInterval::new(900))
        .build();

    scheduler.run_forever(async {}).await;

    assert_eq!(agent.open_count(), 0);
}
