use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use apify_client::ApifyClient;
use feedpulse_common::Config;
use feedpulse_ingest::{ContentStore, HttpClassifier, IngestionPipeline, ProviderFeed};
use feedpulse_notify::{NotificationEngine, NotifyStore};
use feedpulse_worker::{NotifyJob, PeriodicWorker, ScrapeJob};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("feedpulse=info".parse()?))
        .init();

    info!("FeedPulse worker starting...");

    // Load config
    let config = Config::from_env();
    config.log_redacted();

    // Connect to Postgres and run migrations
    let store = Arc::new(feedpulse_store::connect(&config.database_url).await?);
    store.migrate().await?;

    // External collaborators
    let client = Arc::new(ApifyClient::new(config.apify_token.clone()));
    let classifier = Arc::new(HttpClassifier::new(&config.classifier_url));

    let pipeline = Arc::new(IngestionPipeline::new(
        client.clone() as Arc<dyn ProviderFeed>,
        classifier,
        store.clone() as Arc<dyn ContentStore>,
    ));
    let engine = Arc::new(NotificationEngine::new(
        store.clone() as Arc<dyn NotifyStore>,
    ));

    // Ctrl-C flips the shared flag; every loop stops at its next checkpoint,
    // letting in-flight calls run to completion.
    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received, stopping workers");
                cancelled.store(true, Ordering::Relaxed);
            }
        });
    }

    let mut handles = Vec::new();

    // One scrape loop per platform that has targets configured right now.
    // The target lists themselves are still re-read fresh every cycle.
    for platform in Config::configured_platforms() {
        let job = ScrapeJob::new(
            platform,
            client.clone(),
            pipeline.clone(),
            config.scrape_limit,
            config.ingest_on_complete,
        );
        let worker = PeriodicWorker::new(
            config.scrape_cycle,
            config.target_delay,
            cancelled.clone(),
        );
        handles.push(tokio::spawn(async move { worker.run(&job).await }));
    }

    // Notification matching loop.
    let notify_job = NotifyJob::new(engine);
    let notify_worker = PeriodicWorker::new(config.notify_cycle, Duration::ZERO, cancelled.clone());
    handles.push(tokio::spawn(
        async move { notify_worker.run(&notify_job).await },
    ));

    for handle in handles {
        let _ = handle.await;
    }

    info!("FeedPulse worker stopped");
    Ok(())
}
