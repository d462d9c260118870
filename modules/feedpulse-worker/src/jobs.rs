// The two production jobs driven by PeriodicWorker: per-platform scraping
// and the notification matching pass.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use apify_client::ApifyClient;
use feedpulse_common::config::targets_from_env;
use feedpulse_common::{Platform, Target};
use feedpulse_ingest::IngestionPipeline;
use feedpulse_notify::NotificationEngine;

use crate::periodic::CycleJob;

/// Triggers one provider scrape job per configured target of one platform.
pub struct ScrapeJob {
    name: String,
    platform: Platform,
    client: Arc<ApifyClient>,
    pipeline: Arc<IngestionPipeline>,
    scrape_limit: u32,
    /// Single-process deployment mode: poll the run to completion and ingest
    /// its dataset in-process instead of waiting for a webhook.
    ingest_on_complete: bool,
}

impl ScrapeJob {
    pub fn new(
        platform: Platform,
        client: Arc<ApifyClient>,
        pipeline: Arc<IngestionPipeline>,
        scrape_limit: u32,
        ingest_on_complete: bool,
    ) -> Self {
        Self {
            name: format!("scrape:{platform}"),
            platform,
            client,
            pipeline,
            scrape_limit,
            ingest_on_complete,
        }
    }
}

#[async_trait]
impl CycleJob for ScrapeJob {
    type Item = Target;

    fn name(&self) -> &str {
        &self.name
    }

    async fn list_items(&self) -> anyhow::Result<Vec<Target>> {
        Ok(targets_from_env(self.platform, self.scrape_limit))
    }

    async fn run_item(&self, target: &Target) -> anyhow::Result<()> {
        let run = match self.platform {
            Platform::Instagram => {
                self.client
                    .start_instagram_scrape(&target.handle, target.limit)
                    .await?
            }
            Platform::Facebook => {
                self.client
                    .start_facebook_scrape(&target.handle, target.limit)
                    .await?
            }
            Platform::X => {
                self.client
                    .start_x_scrape(&target.handle, target.limit)
                    .await?
            }
        };
        info!(target = %target, run_id = %run.id, "Scrape job started");

        if self.ingest_on_complete {
            let completed = self.client.wait_for_run(&run.id).await?;
            let outcome = self
                .pipeline
                .ingest(self.platform, &completed.default_dataset_id)
                .await?;
            info!(
                target = %target,
                dataset_id = %completed.default_dataset_id,
                %outcome,
                "Completed run ingested"
            );
        }
        Ok(())
    }
}

/// Runs the notification matching pass, one user per item so a user-level
/// failure is isolated by the worker loop.
pub struct NotifyJob {
    engine: Arc<NotificationEngine>,
}

impl NotifyJob {
    pub fn new(engine: Arc<NotificationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl CycleJob for NotifyJob {
    type Item = Uuid;

    fn name(&self) -> &str {
        "notify"
    }

    async fn list_items(&self) -> anyhow::Result<Vec<Uuid>> {
        self.engine.store().get_user_ids().await
    }

    async fn run_item(&self, user_id: &Uuid) -> anyhow::Result<()> {
        let created = self.engine.notify_user(*user_id).await?;
        if created > 0 {
            info!(%user_id, created, "New notifications for user");
        }
        Ok(())
    }
}
