use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// --- Platforms ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Facebook,
    X,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Instagram => write!(f, "instagram"),
            Platform::Facebook => write!(f, "facebook"),
            Platform::X => write!(f, "x"),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl std::str::FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instagram" => Ok(Platform::Instagram),
            "facebook" => Ok(Platform::Facebook),
            "x" | "twitter" => Ok(Platform::X),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

// --- Scrape targets ---

/// An external identity to scrape: a username, page URL, or handle.
/// Enumerated fresh from configuration on every scheduler cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub platform: Platform,
    pub handle: String,
    pub limit: u32,
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.platform, self.handle)
    }
}

// --- Domain records ---

/// A social media post, keyed by the id the source platform assigned.
/// That id is stable across re-scrapes, so it is the natural key for
/// idempotent ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub platform: Platform,
    pub text: String,
    pub author_username: Option<String>,
    pub author_name: Option<String>,
    pub permalink: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub share_count: i64,
    pub view_count: i64,
    /// Opaque media payload from the provider. Stored verbatim, never
    /// interpreted by this core.
    pub media: Option<serde_json::Value>,
    /// Classification label. None until classified, or when classification
    /// failed for this post.
    pub topic: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
}

/// A comment on a post. References the owning post by id; rows are inserted
/// after their parent post within one ingestion pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub text: String,
    pub author_username: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hashtag {
    pub post_id: String,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub post_id: String,
    pub username: String,
}

// --- Users and notifications ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

/// Durable proof that a given user has been shown a given post.
/// At most one record exists per (user, post) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub user_id: Uuid,
    pub post_id: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

/// Canonical form of a topic label for preference matching: trimmed and
/// lower-cased. Applied to both the user's preferences and the post's topic.
pub fn normalize_topic(topic: &str) -> String {
    topic.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_topic("  Tech "), "tech");
        assert_eq!(normalize_topic("SPORT"), "sport");
        assert_eq!(normalize_topic(""), "");
    }

    #[test]
    fn platform_round_trips_through_str() {
        for p in [Platform::Instagram, Platform::Facebook, Platform::X] {
            assert_eq!(p.to_string().parse::<Platform>().unwrap(), p);
        }
        assert_eq!("twitter".parse::<Platform>().unwrap(), Platform::X);
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn target_displays_platform_and_handle() {
        let t = Target {
            platform: Platform::Instagram,
            handle: "natgeo".into(),
            limit: 30,
        };
        assert_eq!(t.to_string(), "instagram:natgeo");
    }
}
