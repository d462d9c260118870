// Trait abstractions for the ingestion pipeline's dependencies.
//
// ProviderFeed replaces ApifyClient and ContentStore replaces PgStore at the
// pipeline boundary. These enable deterministic testing with in-memory
// mocks: no network, no database.

use anyhow::Result;
use async_trait::async_trait;

use feedpulse_common::{Comment, Hashtag, Mention, Post};
use feedpulse_store::PgStore;

// ---------------------------------------------------------------------------
// ProviderFeed — replaces ApifyClient
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ProviderFeed: Send + Sync {
    /// Fetch the raw items of a completed dataset. The item shape is
    /// platform-specific and opaque beyond what the mapper extracts.
    async fn fetch_items(&self, dataset_id: &str) -> Result<Vec<serde_json::Value>>;
}

#[async_trait]
impl ProviderFeed for apify_client::ApifyClient {
    async fn fetch_items(&self, dataset_id: &str) -> Result<Vec<serde_json::Value>> {
        Ok(self.fetch_dataset_items(dataset_id).await?)
    }
}

// ---------------------------------------------------------------------------
// ContentStore — replaces PgStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Upsert a batch of posts atomically. Re-ingesting an existing id must
    /// not create a duplicate row.
    async fn upsert_posts(&self, posts: &[Post]) -> Result<()>;

    async fn insert_comments(&self, comments: &[Comment]) -> Result<()>;

    async fn insert_hashtags(&self, hashtags: &[Hashtag]) -> Result<()>;

    async fn insert_mentions(&self, mentions: &[Mention]) -> Result<()>;
}

#[async_trait]
impl ContentStore for PgStore {
    async fn upsert_posts(&self, posts: &[Post]) -> Result<()> {
        Ok(PgStore::upsert_posts(self, posts).await?)
    }

    async fn insert_comments(&self, comments: &[Comment]) -> Result<()> {
        Ok(PgStore::insert_comments(self, comments).await?)
    }

    async fn insert_hashtags(&self, hashtags: &[Hashtag]) -> Result<()> {
        Ok(PgStore::insert_hashtags(self, hashtags).await?)
    }

    async fn insert_mentions(&self, mentions: &[Mention]) -> Result<()> {
        Ok(PgStore::insert_mentions(self, mentions).await?)
    }
}

