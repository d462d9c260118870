use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wrapper for Apify API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Apify actor run metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: String,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: String,
    #[serde(rename = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "finishedAt")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunData {
    /// Terminal statuses per the Apify run lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status.as_str(),
            "SUCCEEDED" | "FAILED" | "ABORTED" | "TIMED-OUT"
        )
    }
}

// --- Actor input types ---

/// Input for the apify/instagram-post-scraper actor.
#[derive(Debug, Clone, Serialize)]
pub struct InstagramScraperInput {
    pub username: Vec<String>,
    #[serde(rename = "resultsLimit")]
    pub results_limit: u32,
}

/// Input for the apify/facebook-posts-scraper actor.
#[derive(Debug, Clone, Serialize)]
pub struct FacebookScraperInput {
    #[serde(rename = "startUrls")]
    pub start_urls: Vec<StartUrl>,
    #[serde(rename = "resultsLimit")]
    pub results_limit: u32,
}

/// A start URL entry for Facebook scraper input.
#[derive(Debug, Clone, Serialize)]
pub struct StartUrl {
    pub url: String,
}

/// Input for the apidojo/tweet-scraper actor.
#[derive(Debug, Clone, Serialize)]
pub struct XScraperInput {
    #[serde(rename = "twitterHandles")]
    pub twitter_handles: Vec<String>,
    #[serde(rename = "maxItems")]
    pub max_items: u32,
}

// --- Dataset item types ---
//
// These mirror the actors' output schemas. Only the fields the ingestion
// mapper extracts are modeled; everything else stays in the raw JSON item.

/// A single Instagram post from the Apify dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct InstagramItem {
    pub id: Option<String>,
    pub caption: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "ownerUsername")]
    pub owner_username: Option<String>,
    #[serde(rename = "ownerFullName")]
    pub owner_full_name: Option<String>,
    #[serde(rename = "likesCount")]
    pub likes_count: Option<i64>,
    #[serde(rename = "commentsCount")]
    pub comments_count: Option<i64>,
    #[serde(rename = "videoViewCount")]
    pub video_view_count: Option<i64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub hashtags: Option<Vec<String>>,
    pub mentions: Option<Vec<String>>,
    #[serde(rename = "latestComments")]
    pub latest_comments: Option<Vec<InstagramComment>>,
}

/// A comment nested inside an Instagram post item.
#[derive(Debug, Clone, Deserialize)]
pub struct InstagramComment {
    pub id: Option<String>,
    pub text: Option<String>,
    #[serde(rename = "ownerUsername")]
    pub owner_username: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A single Facebook page post from the Apify dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct FacebookItem {
    #[serde(rename = "postId")]
    pub post_id: Option<String>,
    pub text: Option<String>,
    pub url: Option<String>,
    /// ISO timestamp string; the actor does not guarantee a fixed format.
    pub time: Option<String>,
    #[serde(rename = "pageName")]
    pub page_name: Option<String>,
    pub likes: Option<i64>,
    pub comments: Option<i64>,
    pub shares: Option<i64>,
}

/// A single X/Twitter post from the Apify dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct XItem {
    pub id: Option<String>,
    pub text: Option<String>,
    #[serde(rename = "fullText")]
    pub full_text: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    pub author: Option<XAuthor>,
    #[serde(rename = "likeCount")]
    pub like_count: Option<i64>,
    #[serde(rename = "replyCount")]
    pub reply_count: Option<i64>,
    #[serde(rename = "retweetCount")]
    pub retweet_count: Option<i64>,
    #[serde(rename = "viewCount")]
    pub view_count: Option<i64>,
    pub entities: Option<XEntities>,
}

impl XItem {
    /// Returns whichever text field is populated, preferring `fullText`.
    pub fn content(&self) -> Option<&str> {
        self.full_text.as_deref().or(self.text.as_deref())
    }
}

/// Author info nested inside an X item.
#[derive(Debug, Clone, Deserialize)]
pub struct XAuthor {
    #[serde(rename = "userName")]
    pub user_name: Option<String>,
    pub name: Option<String>,
}

/// Parsed entities nested inside an X item.
#[derive(Debug, Clone, Deserialize)]
pub struct XEntities {
    pub hashtags: Option<Vec<XHashtag>>,
    #[serde(rename = "user_mentions")]
    pub user_mentions: Option<Vec<XMention>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XHashtag {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XMention {
    pub screen_name: Option<String>,
}
