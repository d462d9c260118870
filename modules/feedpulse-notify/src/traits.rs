// Store seam for the matching engine. PgStore implements it in production;
// tests use an in-memory mock.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use feedpulse_common::Post;
use feedpulse_store::PgStore;

#[async_trait]
pub trait NotifyStore: Send + Sync {
    async fn get_user_ids(&self) -> Result<Vec<Uuid>>;

    async fn get_preferences(&self, user_id: Uuid) -> Result<Vec<String>>;

    async fn get_notified_ids(&self, user_id: Uuid) -> Result<HashSet<String>>;

    async fn get_all_posts(&self) -> Result<Vec<Post>>;

    /// Conditionally record a notification; returns true only when this call
    /// created the record. Must be concurrency-safe: this operation, not a
    /// prior read, is the deduplication guard.
    async fn mark_notified(&self, user_id: Uuid, post_id: &str) -> Result<bool>;
}

#[async_trait]
impl NotifyStore for PgStore {
    async fn get_user_ids(&self) -> Result<Vec<Uuid>> {
        Ok(PgStore::get_user_ids(self).await?)
    }

    async fn get_preferences(&self, user_id: Uuid) -> Result<Vec<String>> {
        Ok(PgStore::get_preferences(self, user_id).await?)
    }

    async fn get_notified_ids(&self, user_id: Uuid) -> Result<HashSet<String>> {
        Ok(PgStore::get_notified_ids(self, user_id).await?)
    }

    async fn get_all_posts(&self) -> Result<Vec<Post>> {
        Ok(PgStore::get_all_posts(self).await?)
    }

    async fn mark_notified(&self, user_id: Uuid, post_id: &str) -> Result<bool> {
        Ok(PgStore::mark_notified(self, user_id, post_id).await?)
    }
}
