// Converts provider-native dataset items into domain records. Each platform
// has its own raw shape; items that cannot be decoded or carry no id are
// skipped with a warning, never aborting the batch.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::warn;

use apify_client::types::{FacebookItem, InstagramItem, XItem};
use feedpulse_common::{Comment, Hashtag, Mention, Platform, Post};

/// Mapped output of one dataset: posts plus their child entities.
#[derive(Debug, Default)]
pub struct MappedBatch {
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
    pub hashtags: Vec<Hashtag>,
    pub mentions: Vec<Mention>,
    /// Items dropped because they could not be decoded or had no id.
    pub skipped: usize,
}

/// Map raw dataset items to domain records for one platform.
pub fn map_items(platform: Platform, items: &[serde_json::Value]) -> MappedBatch {
    let scraped_at = Utc::now();
    let mut batch = MappedBatch::default();
    for item in items {
        let mapped = match platform {
            Platform::Instagram => map_instagram(item, scraped_at, &mut batch),
            Platform::Facebook => map_facebook(item, scraped_at, &mut batch),
            Platform::X => map_x(item, scraped_at, &mut batch),
        };
        if !mapped {
            batch.skipped += 1;
        }
    }
    batch
}

/// Drop posts whose id already appeared earlier in the batch, keeping the
/// first occurrence. Returns the number dropped. Must run before
/// classification and persistence.
pub fn dedupe_first_by_id(posts: &mut Vec<Post>) -> usize {
    let before = posts.len();
    let mut seen = HashSet::new();
    posts.retain(|p| seen.insert(p.id.clone()));
    before - posts.len()
}

/// Restrict child entities to the posts that survived dedupe, so children of
/// dropped duplicates are not re-attempted.
pub fn retain_children_of(batch: &mut MappedBatch) {
    let ids: HashSet<&str> = batch.posts.iter().map(|p| p.id.as_str()).collect();
    batch.comments.retain(|c| ids.contains(c.post_id.as_str()));
    batch.hashtags.retain(|h| ids.contains(h.post_id.as_str()));
    batch.mentions.retain(|m| ids.contains(m.post_id.as_str()));
}

fn map_instagram(raw: &serde_json::Value, scraped_at: DateTime<Utc>, out: &mut MappedBatch) -> bool {
    let item: InstagramItem = match serde_json::from_value(raw.clone()) {
        Ok(i) => i,
        Err(e) => {
            warn!(error = %e, "Undecodable Instagram item, skipping");
            return false;
        }
    };
    let Some(id) = item.id.filter(|s| !s.is_empty()) else {
        warn!("Instagram item without id, skipping");
        return false;
    };

    for c in item.latest_comments.unwrap_or_default() {
        let Some(comment_id) = c.id.filter(|s| !s.is_empty()) else {
            continue;
        };
        out.comments.push(Comment {
            id: comment_id,
            post_id: id.clone(),
            text: c.text.unwrap_or_default(),
            author_username: c.owner_username,
            posted_at: c.timestamp,
        });
    }
    for tag in item.hashtags.unwrap_or_default() {
        out.hashtags.push(Hashtag {
            post_id: id.clone(),
            tag,
        });
    }
    for username in item.mentions.unwrap_or_default() {
        out.mentions.push(Mention {
            post_id: id.clone(),
            username,
        });
    }

    out.posts.push(Post {
        id,
        platform: Platform::Instagram,
        text: item.caption.unwrap_or_default(),
        author_username: item.owner_username,
        author_name: item.owner_full_name,
        permalink: item.url,
        like_count: item.likes_count.unwrap_or(0),
        comment_count: item.comments_count.unwrap_or(0),
        share_count: 0,
        view_count: item.video_view_count.unwrap_or(0),
        media: raw.get("images").or_else(|| raw.get("displayUrl")).cloned(),
        topic: None,
        posted_at: item.timestamp,
        scraped_at,
    });
    true
}

fn map_facebook(raw: &serde_json::Value, scraped_at: DateTime<Utc>, out: &mut MappedBatch) -> bool {
    let item: FacebookItem = match serde_json::from_value(raw.clone()) {
        Ok(i) => i,
        Err(e) => {
            warn!(error = %e, "Undecodable Facebook item, skipping");
            return false;
        }
    };
    let Some(id) = item.post_id.filter(|s| !s.is_empty()) else {
        warn!("Facebook item without postId, skipping");
        return false;
    };

    out.posts.push(Post {
        id,
        platform: Platform::Facebook,
        text: item.text.unwrap_or_default(),
        author_username: None,
        author_name: item.page_name,
        permalink: item.url,
        like_count: item.likes.unwrap_or(0),
        comment_count: item.comments.unwrap_or(0),
        share_count: item.shares.unwrap_or(0),
        view_count: 0,
        media: raw.get("media").cloned(),
        topic: None,
        posted_at: item.time.as_deref().and_then(parse_loose_timestamp),
        scraped_at,
    });
    true
}

fn map_x(raw: &serde_json::Value, scraped_at: DateTime<Utc>, out: &mut MappedBatch) -> bool {
    let item: XItem = match serde_json::from_value(raw.clone()) {
        Ok(i) => i,
        Err(e) => {
            warn!(error = %e, "Undecodable X item, skipping");
            return false;
        }
    };
    let Some(id) = item.id.clone().filter(|s| !s.is_empty()) else {
        warn!("X item without id, skipping");
        return false;
    };

    if let Some(entities) = &item.entities {
        for h in entities.hashtags.iter().flatten() {
            if let Some(tag) = h.text.clone().filter(|t| !t.is_empty()) {
                out.hashtags.push(Hashtag {
                    post_id: id.clone(),
                    tag,
                });
            }
        }
        for m in entities.user_mentions.iter().flatten() {
            if let Some(username) = m.screen_name.clone().filter(|u| !u.is_empty()) {
                out.mentions.push(Mention {
                    post_id: id.clone(),
                    username,
                });
            }
        }
    }

    let author = item.author.as_ref();
    out.posts.push(Post {
        id,
        platform: Platform::X,
        text: item.content().unwrap_or_default().to_string(),
        author_username: author.and_then(|a| a.user_name.clone()),
        author_name: author.and_then(|a| a.name.clone()),
        permalink: item.url.clone(),
        like_count: item.like_count.unwrap_or(0),
        comment_count: item.reply_count.unwrap_or(0),
        share_count: item.retweet_count.unwrap_or(0),
        view_count: item.view_count.unwrap_or(0),
        media: raw.get("extendedEntities").cloned(),
        topic: None,
        posted_at: item.created_at,
        scraped_at,
    });
    true
}

/// Facebook's actor emits timestamps in a few formats; accept RFC 3339 and
/// the dateless variants it is known to produce.
fn parse_loose_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(t.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ig_item(id: &str, caption: &str) -> serde_json::Value {
        json!({
            "id": id,
            "caption": caption,
            "ownerUsername": "acme",
            "url": format!("https://www.instagram.com/p/{id}/"),
            "likesCount": 3,
            "commentsCount": 1,
            "timestamp": "2026-07-30T08:00:00Z",
            "hashtags": ["launch"],
            "mentions": ["partner"],
            "latestComments": [
                {"id": format!("{id}-c1"), "text": "congrats", "ownerUsername": "fan"}
            ],
            "displayUrl": "https://cdn.example.com/img.jpg"
        })
    }

    #[test]
    fn instagram_item_maps_post_and_children() {
        let batch = map_items(Platform::Instagram, &[ig_item("p1", "We shipped")]);
        assert_eq!(batch.posts.len(), 1);
        assert_eq!(batch.comments.len(), 1);
        assert_eq!(batch.hashtags.len(), 1);
        assert_eq!(batch.mentions.len(), 1);
        assert_eq!(batch.skipped, 0);

        let post = &batch.posts[0];
        assert_eq!(post.id, "p1");
        assert_eq!(post.text, "We shipped");
        assert_eq!(post.like_count, 3);
        assert!(post.topic.is_none());
        assert_eq!(post.media, Some(json!("https://cdn.example.com/img.jpg")));

        assert_eq!(batch.comments[0].post_id, "p1");
        assert_eq!(batch.hashtags[0].tag, "launch");
        assert_eq!(batch.mentions[0].username, "partner");
    }

    #[test]
    fn item_without_id_is_skipped() {
        let items = vec![json!({"caption": "no id here"}), ig_item("p2", "ok")];
        let batch = map_items(Platform::Instagram, &items);
        assert_eq!(batch.posts.len(), 1);
        assert_eq!(batch.skipped, 1);
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let items = vec![ig_item("a", "first"), ig_item("a", "second"), ig_item("b", "other")];
        let mut batch = map_items(Platform::Instagram, &items);
        let dropped = dedupe_first_by_id(&mut batch.posts);
        assert_eq!(dropped, 1);
        assert_eq!(batch.posts.len(), 2);
        assert_eq!(batch.posts[0].text, "first");
    }

    #[test]
    fn children_of_dropped_duplicates_are_pruned() {
        let mut batch = map_items(
            Platform::Instagram,
            &[ig_item("a", "first"), ig_item("a", "second")],
        );
        dedupe_first_by_id(&mut batch.posts);
        retain_children_of(&mut batch);
        // Every remaining child references the surviving post. Identical
        // child keys from the duplicate item are left to the store's
        // insert-ignore semantics.
        assert!(batch.comments.iter().all(|c| c.post_id == "a"));
        assert!(batch.hashtags.iter().all(|h| h.post_id == "a"));
    }

    #[test]
    fn x_item_maps_entities() {
        let item = json!({
            "id": "42",
            "fullText": "big news #tech thanks @sam",
            "url": "https://x.com/acme/status/42",
            "createdAt": "2026-07-01T12:00:00Z",
            "author": {"userName": "acme", "name": "Acme"},
            "likeCount": 10,
            "retweetCount": 2,
            "replyCount": 1,
            "viewCount": 500,
            "entities": {
                "hashtags": [{"text": "tech"}],
                "user_mentions": [{"screen_name": "sam"}]
            }
        });
        let batch = map_items(Platform::X, &[item]);
        assert_eq!(batch.posts.len(), 1);
        let post = &batch.posts[0];
        assert_eq!(post.text, "big news #tech thanks @sam");
        assert_eq!(post.share_count, 2);
        assert_eq!(post.view_count, 500);
        assert_eq!(batch.hashtags[0].tag, "tech");
        assert_eq!(batch.mentions[0].username, "sam");
    }

    #[test]
    fn facebook_item_maps_post_only() {
        let item = json!({
            "postId": "fb9",
            "text": "Community update",
            "url": "https://www.facebook.com/acme/posts/fb9",
            "time": "2026-06-15T09:30:00+00:00",
            "pageName": "Acme",
            "likes": 7,
            "comments": 2,
            "shares": 1,
            "media": [{"thumbnail": "https://cdn.example.com/t.jpg"}]
        });
        let batch = map_items(Platform::Facebook, &[item]);
        assert_eq!(batch.posts.len(), 1);
        assert!(batch.comments.is_empty());
        let post = &batch.posts[0];
        assert_eq!(post.share_count, 1);
        assert!(post.posted_at.is_some());
        assert!(post.media.is_some());
    }

    #[test]
    fn loose_timestamp_accepts_both_formats() {
        assert!(parse_loose_timestamp("2026-06-15T09:30:00+00:00").is_some());
        assert!(parse_loose_timestamp("2026-06-15 09:30:00").is_some());
        assert!(parse_loose_timestamp("yesterday").is_none());
    }
}
