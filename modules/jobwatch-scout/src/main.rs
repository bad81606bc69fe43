use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use jobwatch_common::Config;
use jobwatch_scout::agent::HtmlPageAgent;
use jobwatch_scout::notify::{NoopNotifier, NotifyBackend, TelegramNotifier};
use jobwatch_scout::pipeline::{
    CardSelectors, DiscoveryRun, FilterChain, GeoLookup, ListingExtractor, QueryBuilder,
};
use jobwatch_scout::scheduling::{CycleScheduler, JitteredInterval};
use jobwatch_scout::store::{self, NoopStore, PostingStore};

#[derive(Parser)]
#[command(name = "jobwatch", about = "Polls job listings and forwards fresh postings")]
struct Cli {
    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Log postings instead of sending or storing them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::from_default_env().add_directive("jobwatch=info".parse()?);
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!(once = cli.once, dry_run = cli.dry_run, "Job watch starting...");

    // Load config
    let config = Config::from_env()?;
    config.log_redacted();

    // Sinks
    let (notifier, store, destination): (Arc<dyn NotifyBackend>, Arc<dyn PostingStore>, String) =
        if cli.dry_run {
            info!("Dry run, notifications and storage disabled");
            let destination = config
                .telegram_chat_id
                .clone()
                .unwrap_or_else(|| "dry-run".to_string());
            (
                Arc::new(NoopNotifier) as Arc<dyn NotifyBackend>,
                Arc::new(NoopStore) as Arc<dyn PostingStore>,
                destination,
            )
        } else {
            let (token, chat_id) = config.telegram()?;
            (
                Arc::new(TelegramNotifier::new(token)?) as Arc<dyn NotifyBackend>,
                store::from_config(&config)?,
                chat_id.to_string(),
            )
        };

    // Pipeline
    let selectors = CardSelectors::default();
    let agent = HtmlPageAgent::from_config(&config, &selectors)?;
    info!(source = agent.source_name(), "Page agent ready");

    let query_builder =
        QueryBuilder::new(&config.search_base_url, GeoLookup::new(config.geo_ids.clone()))?;
    let discovery = DiscoveryRun::new(
        query_builder,
        ListingExtractor::new(selectors),
        FilterChain::new(config.filter_context()),
        config.job_title.clone(),
        config.job_location.clone(),
    );

    let scheduler = CycleScheduler::builder()
        .agent(Arc::new(agent))
        .notifier(notifier)
        .store(store)
        .destination(destination)
        .discovery(discovery)
        .interval(JitteredInterval::new(config.recency_threshold_secs))
        .build();

    if cli.once {
        let stats = scheduler.run_cycle().await;
        info!(aborted = stats.aborted, "Single cycle complete");
        return Ok(());
    }

    scheduler
        .run_forever(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    info!("Job watch stopped");
    Ok(())
}
