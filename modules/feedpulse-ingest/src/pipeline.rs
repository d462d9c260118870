//! Dataset ingestion: fetch a completed provider dataset, map it to domain
//! records, dedupe, classify, persist.
//!
//! One invocation handles one dataset. The two provider-side phases (start
//! job, dataset ready) share no in-memory state: correlation is by the
//! dataset id the caller supplies, whether that caller is the webhook
//! handler in the API layer or the in-process poll loop.

use std::sync::Arc;

use tracing::{info, warn};

use feedpulse_common::Platform;

use crate::error::{IngestError, Result};
use crate::mapper;
use crate::traits::{ContentStore, ProviderFeed};
use crate::TopicClassifier;

pub struct IngestionPipeline {
    provider: Arc<dyn ProviderFeed>,
    classifier: Arc<dyn TopicClassifier>,
    store: Arc<dyn ContentStore>,
}

/// Counts from one ingestion pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub fetched: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub posts: usize,
    pub comments: usize,
    pub hashtags: usize,
    pub mentions: usize,
    pub classification_failures: usize,
}

impl std::fmt::Display for IngestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "fetched={} posts={} comments={} hashtags={} mentions={} \
             duplicates={} skipped={} classification_failures={}",
            self.fetched,
            self.posts,
            self.comments,
            self.hashtags,
            self.mentions,
            self.duplicates,
            self.skipped,
            self.classification_failures,
        )
    }
}

impl IngestionPipeline {
    pub fn new(
        provider: Arc<dyn ProviderFeed>,
        classifier: Arc<dyn TopicClassifier>,
        store: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            provider,
            classifier,
            store,
        }
    }

    /// Ingest one completed dataset. Steps are strictly ordered: fetch, map,
    /// dedupe, classify, persist posts, persist children.
    pub async fn ingest(&self, platform: Platform, dataset_id: &str) -> Result<IngestOutcome> {
        let raw = self
            .provider
            .fetch_items(dataset_id)
            .await
            .map_err(|e| IngestError::ProviderFetch {
                dataset_id: dataset_id.to_string(),
                message: e.to_string(),
            })?;

        if raw.is_empty() {
            info!(%platform, dataset_id, "Dataset is empty, nothing to ingest");
            return Ok(IngestOutcome::default());
        }

        let mut batch = mapper::map_items(platform, &raw);
        let duplicates = mapper::dedupe_first_by_id(&mut batch.posts);
        if duplicates > 0 {
            mapper::retain_children_of(&mut batch);
        }

        let mut outcome = IngestOutcome {
            fetched: raw.len(),
            skipped: batch.skipped,
            duplicates,
            posts: batch.posts.len(),
            comments: batch.comments.len(),
            hashtags: batch.hashtags.len(),
            mentions: batch.mentions.len(),
            classification_failures: 0,
        };

        // Classify after dedupe so duplicate ids never cost a second model
        // call. A per-post failure leaves that post's topic empty and never
        // aborts the batch.
        for post in &mut batch.posts {
            if post.text.trim().is_empty() {
                continue;
            }
            match self.classifier.classify(&post.text).await {
                Ok(label) => post.topic = Some(label),
                Err(e) => {
                    warn!(post_id = %post.id, error = %e, "Classification failed, leaving topic empty");
                    outcome.classification_failures += 1;
                }
            }
        }

        // Posts first; children reference them.
        self.store
            .upsert_posts(&batch.posts)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;

        if !batch.comments.is_empty() {
            self.store
                .insert_comments(&batch.comments)
                .await
                .map_err(|e| IngestError::Store(e.to_string()))?;
        }
        if !batch.hashtags.is_empty() {
            self.store
                .insert_hashtags(&batch.hashtags)
                .await
                .map_err(|e| IngestError::Store(e.to_string()))?;
        }
        if !batch.mentions.is_empty() {
            self.store
                .insert_mentions(&batch.mentions)
                .await
                .map_err(|e| IngestError::Store(e.to_string()))?;
        }

        info!(%platform, dataset_id, %outcome, "Dataset ingested");
        Ok(outcome)
    }
}
