//! Ingestion pipeline tests against in-memory mocks: no network, no database.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use feedpulse_common::{Comment, Hashtag, Mention, Platform, Post};
use feedpulse_ingest::{
    ContentStore, IngestError, IngestionPipeline, ProviderFeed, TopicClassifier,
};

// ---------------------------------------------------------------------------
// Mocks
// ---------------------------------------------------------------------------

struct MockFeed {
    items: Vec<serde_json::Value>,
    fail: bool,
}

#[async_trait]
impl ProviderFeed for MockFeed {
    async fn fetch_items(&self, _dataset_id: &str) -> Result<Vec<serde_json::Value>> {
        if self.fail {
            anyhow::bail!("API error (status 404): dataset not found");
        }
        Ok(self.items.clone())
    }
}

/// Labels everything "other" unless the text matches a configured label;
/// fails outright for texts in `fail_on`.
#[derive(Default)]
struct MockClassifier {
    labels: HashMap<String, String>,
    fail_on: HashSet<String>,
    calls: AtomicUsize,
}

#[async_trait]
impl TopicClassifier for MockClassifier {
    async fn classify(&self, text: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.contains(text) {
            anyhow::bail!("Classifier error (status 500): model overloaded");
        }
        Ok(self
            .labels
            .get(text)
            .cloned()
            .unwrap_or_else(|| "other".to_string()))
    }
}

/// In-memory store mirroring PgStore's write semantics: posts upsert by id
/// (counters refreshed, topic coalesced), children insert-ignore on their
/// natural keys.
#[derive(Default)]
struct MemoryStore {
    posts: Mutex<HashMap<String, Post>>,
    comments: Mutex<HashMap<String, Comment>>,
    hashtags: Mutex<HashSet<(String, String)>>,
    mentions: Mutex<HashSet<(String, String)>>,
    fail_comments: bool,
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn upsert_posts(&self, posts: &[Post]) -> Result<()> {
        let mut stored = self.posts.lock().unwrap();
        for post in posts {
            match stored.get_mut(&post.id) {
                Some(existing) => {
                    existing.like_count = post.like_count;
                    existing.comment_count = post.comment_count;
                    existing.share_count = post.share_count;
                    existing.view_count = post.view_count;
                    if post.topic.is_some() {
                        existing.topic = post.topic.clone();
                    }
                    existing.scraped_at = post.scraped_at;
                }
                None => {
                    stored.insert(post.id.clone(), post.clone());
                }
            }
        }
        Ok(())
    }

    async fn insert_comments(&self, comments: &[Comment]) -> Result<()> {
        if self.fail_comments {
            anyhow::bail!("Database error: connection reset");
        }
        let mut stored = self.comments.lock().unwrap();
        for c in comments {
            stored.entry(c.id.clone()).or_insert_with(|| c.clone());
        }
        Ok(())
    }

    async fn insert_hashtags(&self, hashtags: &[Hashtag]) -> Result<()> {
        let mut stored = self.hashtags.lock().unwrap();
        for h in hashtags {
            stored.insert((h.post_id.clone(), h.tag.clone()));
        }
        Ok(())
    }

    async fn insert_mentions(&self, mentions: &[Mention]) -> Result<()> {
        let mut stored = self.mentions.lock().unwrap();
        for m in mentions {
            stored.insert((m.post_id.clone(), m.username.clone()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn ig_item(id: &str, caption: &str) -> serde_json::Value {
    json!({
        "id": id,
        "caption": caption,
        "ownerUsername": "acme",
        "url": format!("https://www.instagram.com/p/{id}/"),
        "likesCount": 5,
        "commentsCount": 1,
        "timestamp": "2026-07-30T08:00:00Z",
        "hashtags": ["news"],
        "mentions": ["friend"],
        "latestComments": [
            {"id": format!("{id}-c1"), "text": "nice", "ownerUsername": "fan"}
        ]
    })
}

fn pipeline(
    feed: MockFeed,
    classifier: MockClassifier,
    store: Arc<MemoryStore>,
) -> IngestionPipeline {
    IngestionPipeline::new(Arc::new(feed), Arc::new(classifier), store)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_dataset_is_a_successful_empty_outcome() {
    let store = Arc::new(MemoryStore::default());
    let p = pipeline(
        MockFeed { items: vec![], fail: false },
        MockClassifier::default(),
        store.clone(),
    );

    let outcome = p.ingest(Platform::Instagram, "ds-empty").await.unwrap();
    assert_eq!(outcome.fetched, 0);
    assert_eq!(outcome.posts, 0);
    assert!(store.posts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn provider_fetch_error_surfaces_and_writes_nothing() {
    let store = Arc::new(MemoryStore::default());
    let p = pipeline(
        MockFeed { items: vec![], fail: true },
        MockClassifier::default(),
        store.clone(),
    );

    let err = p.ingest(Platform::Instagram, "ds-gone").await.unwrap_err();
    assert!(matches!(err, IngestError::ProviderFetch { .. }));
    assert!(store.posts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_ids_collapse_to_first_occurrence() {
    let store = Arc::new(MemoryStore::default());
    let items = vec![ig_item("a", "x"), ig_item("a", "y")];
    let p = pipeline(
        MockFeed { items, fail: false },
        MockClassifier::default(),
        store.clone(),
    );

    let outcome = p.ingest(Platform::Instagram, "ds-dup").await.unwrap();
    assert_eq!(outcome.posts, 1);
    assert_eq!(outcome.duplicates, 1);

    let posts = store.posts.lock().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts.get("a").unwrap().text, "x");
}

#[tokio::test]
async fn classification_failure_never_aborts_the_batch() {
    let store = Arc::new(MemoryStore::default());
    let items = vec![ig_item("a", "alpha"), ig_item("b", "beta"), ig_item("c", "gamma")];
    let classifier = MockClassifier {
        labels: HashMap::from([
            ("alpha".to_string(), "tech".to_string()),
            ("gamma".to_string(), "sport".to_string()),
        ]),
        fail_on: HashSet::from(["beta".to_string()]),
        calls: AtomicUsize::new(0),
    };
    let p = pipeline(MockFeed { items, fail: false }, classifier, store.clone());

    let outcome = p.ingest(Platform::Instagram, "ds-cls").await.unwrap();
    assert_eq!(outcome.posts, 3);
    assert_eq!(outcome.classification_failures, 1);

    let posts = store.posts.lock().unwrap();
    assert_eq!(posts.get("a").unwrap().topic.as_deref(), Some("tech"));
    assert_eq!(posts.get("b").unwrap().topic, None);
    assert_eq!(posts.get("c").unwrap().topic.as_deref(), Some("sport"));
}

#[tokio::test]
async fn ingesting_the_same_dataset_twice_is_idempotent() {
    let store = Arc::new(MemoryStore::default());
    let items = vec![ig_item("a", "alpha"), ig_item("b", "beta")];

    for _ in 0..2 {
        let p = pipeline(
            MockFeed { items: items.clone(), fail: false },
            MockClassifier::default(),
            store.clone(),
        );
        p.ingest(Platform::Instagram, "ds-same").await.unwrap();
    }

    let posts = store.posts.lock().unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts.get("a").unwrap().text, "alpha");
    assert_eq!(posts.get("a").unwrap().topic.as_deref(), Some("other"));
    assert_eq!(store.comments.lock().unwrap().len(), 2);
    assert_eq!(store.hashtags.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn children_are_persisted_with_their_posts() {
    let store = Arc::new(MemoryStore::default());
    let p = pipeline(
        MockFeed { items: vec![ig_item("p1", "hello")], fail: false },
        MockClassifier::default(),
        store.clone(),
    );

    p.ingest(Platform::Instagram, "ds-kids").await.unwrap();

    assert!(store.comments.lock().unwrap().contains_key("p1-c1"));
    assert!(store
        .hashtags
        .lock()
        .unwrap()
        .contains(&("p1".to_string(), "news".to_string())));
    assert!(store
        .mentions
        .lock()
        .unwrap()
        .contains(&("p1".to_string(), "friend".to_string())));
}

#[tokio::test]
async fn child_write_failure_propagates() {
    let store = Arc::new(MemoryStore {
        fail_comments: true,
        ..Default::default()
    });
    let p = pipeline(
        MockFeed { items: vec![ig_item("p1", "hello")], fail: false },
        MockClassifier::default(),
        store.clone(),
    );

    let err = p.ingest(Platform::Instagram, "ds-bad").await.unwrap_err();
    assert!(matches!(err, IngestError::Store(_)));
    // Posts landed before the child write failed; the upsert keeps the
    // retry (webhook redelivery) idempotent.
    assert_eq!(store.posts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn posts_with_empty_text_skip_classification() {
    let store = Arc::new(MemoryStore::default());
    let classifier = MockClassifier::default();
    let items = vec![ig_item("a", ""), ig_item("b", "real text")];
    let p = pipeline(MockFeed { items, fail: false }, classifier, store.clone());

    let outcome = p.ingest(Platform::Instagram, "ds-blank").await.unwrap();
    assert_eq!(outcome.posts, 2);
    assert_eq!(outcome.classification_failures, 0);

    let posts = store.posts.lock().unwrap();
    assert_eq!(posts.get("a").unwrap().topic, None);
    assert_eq!(posts.get("b").unwrap().topic.as_deref(), Some("other"));
}
