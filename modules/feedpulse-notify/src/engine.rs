//! Notification matching: one pass per user over the current post set,
//! recording each newly matching post at most once.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};
use uuid::Uuid;

use feedpulse_common::normalize_topic;

use crate::traits::NotifyStore;

pub struct NotificationEngine {
    store: Arc<dyn NotifyStore>,
}

/// Counts from one full matching pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NotifyStats {
    pub users_processed: u64,
    pub users_failed: u64,
    pub notifications_created: u64,
}

impl std::fmt::Display for NotifyStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "users_processed={} users_failed={} notifications_created={}",
            self.users_processed, self.users_failed, self.notifications_created,
        )
    }
}

impl NotificationEngine {
    pub fn new(store: Arc<dyn NotifyStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn NotifyStore> {
        &self.store
    }

    /// Match and mark new posts for a single user. The user id comes from
    /// the caller (periodic pass or authenticated request context).
    /// Returns the number of notification records this call created.
    ///
    /// The store's conditional insert is the dedup point: if a concurrent
    /// pass marks the same (user, post) pair first, this call observes an
    /// already-marked pair and does not count or log it as a delivery.
    pub async fn notify_user(&self, user_id: Uuid) -> Result<u64> {
        let preferences: HashSet<String> = self
            .store
            .get_preferences(user_id)
            .await?
            .iter()
            .map(|t| normalize_topic(t))
            .filter(|t| !t.is_empty())
            .collect();

        if preferences.is_empty() {
            debug!(%user_id, "User has no topic preferences, skipping");
            return Ok(0);
        }

        let notified = self.store.get_notified_ids(user_id).await?;
        let posts = self.store.get_all_posts().await?;

        let mut created = 0u64;
        for post in &posts {
            let Some(topic) = post.topic.as_deref() else {
                continue;
            };
            if !preferences.contains(&normalize_topic(topic)) {
                continue;
            }
            if notified.contains(&post.id) {
                continue;
            }

            if self.store.mark_notified(user_id, &post.id).await? {
                info!(%user_id, post_id = %post.id, topic, "Notification recorded");
                created += 1;
            } else {
                debug!(%user_id, post_id = %post.id, "Already marked by a concurrent pass");
            }
        }

        Ok(created)
    }

    /// Run one full pass over all users. Per-user failures are contained and
    /// logged; they never stop processing of the remaining users.
    pub async fn run_pass(&self) -> Result<NotifyStats> {
        let user_ids = self.store.get_user_ids().await?;
        let mut stats = NotifyStats::default();

        for user_id in user_ids {
            match self.notify_user(user_id).await {
                Ok(created) => {
                    stats.users_processed += 1;
                    stats.notifications_created += created;
                }
                Err(e) => {
                    warn!(%user_id, error = %e, "Matching failed for user, continuing");
                    stats.users_failed += 1;
                }
            }
        }

        info!(%stats, "Notification pass complete");
        Ok(stats)
    }
}
