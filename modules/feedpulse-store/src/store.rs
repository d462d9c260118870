// Postgres persistence for posts, preferences, and notification records.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use feedpulse_common::{Comment, Hashtag, Mention, NotificationRecord, Platform, Post, User};

use crate::error::{Result, StoreError};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

/// A row from the posts table. Converted to the domain `Post` on read.
#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: String,
    platform: String,
    body: String,
    author_username: Option<String>,
    author_name: Option<String>,
    permalink: Option<String>,
    like_count: i64,
    comment_count: i64,
    share_count: i64,
    view_count: i64,
    media: Option<serde_json::Value>,
    topic: Option<String>,
    posted_at: Option<DateTime<Utc>>,
    scraped_at: DateTime<Utc>,
}

impl PostRow {
    fn into_post(self) -> Result<Post> {
        let platform: Platform = self
            .platform
            .parse()
            .map_err(|e| StoreError::Decode(format!("post {}: {e}", self.id)))?;
        Ok(Post {
            id: self.id,
            platform,
            text: self.body,
            author_username: self.author_username,
            author_name: self.author_name,
            permalink: self.permalink,
            like_count: self.like_count,
            comment_count: self.comment_count,
            share_count: self.share_count,
            view_count: self.view_count,
            media: self.media,
            topic: self.topic,
            posted_at: self.posted_at,
            scraped_at: self.scraped_at,
        })
    }
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // --- Posts ---

    /// Upsert a batch of posts in one transaction. Re-ingesting an id
    /// refreshes its engagement counters; an existing topic is never
    /// overwritten with NULL (classification may have failed on the re-run).
    pub async fn upsert_posts(&self, posts: &[Post]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for post in posts {
            sqlx::query(
                r#"
                INSERT INTO posts
                    (id, platform, body, author_username, author_name, permalink,
                     like_count, comment_count, share_count, view_count,
                     media, topic, posted_at, scraped_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                ON CONFLICT (id) DO UPDATE SET
                    like_count = EXCLUDED.like_count,
                    comment_count = EXCLUDED.comment_count,
                    share_count = EXCLUDED.share_count,
                    view_count = EXCLUDED.view_count,
                    topic = COALESCE(EXCLUDED.topic, posts.topic),
                    scraped_at = EXCLUDED.scraped_at
                "#,
            )
            .bind(&post.id)
            .bind(post.platform.to_string())
            .bind(&post.text)
            .bind(&post.author_username)
            .bind(&post.author_name)
            .bind(&post.permalink)
            .bind(post.like_count)
            .bind(post.comment_count)
            .bind(post.share_count)
            .bind(post.view_count)
            .bind(&post.media)
            .bind(&post.topic)
            .bind(post.posted_at)
            .bind(post.scraped_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_all_posts(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(
            "SELECT * FROM posts ORDER BY posted_at DESC NULLS LAST",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(PostRow::into_post).collect()
    }

    pub async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(PostRow::into_post).transpose()
    }

    // --- Child entities ---

    pub async fn insert_comments(&self, comments: &[Comment]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for c in comments {
            sqlx::query(
                r#"
                INSERT INTO comments (id, post_id, body, author_username, posted_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(&c.id)
            .bind(&c.post_id)
            .bind(&c.text)
            .bind(&c.author_username)
            .bind(c.posted_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn insert_hashtags(&self, hashtags: &[Hashtag]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for h in hashtags {
            sqlx::query(
                "INSERT INTO hashtags (post_id, tag) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(&h.post_id)
            .bind(&h.tag)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn insert_mentions(&self, mentions: &[Mention]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for m in mentions {
            sqlx::query(
                "INSERT INTO mentions (post_id, username) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(&m.post_id)
            .bind(&m.username)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    // --- Users and preferences ---

    pub async fn upsert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                display_name = EXCLUDED.display_name
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.display_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_user_ids(&self) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    pub async fn get_preferences(&self, user_id: Uuid) -> Result<Vec<String>> {
        let topics =
            sqlx::query_scalar::<_, String>("SELECT topic FROM user_topics WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(topics)
    }

    /// Atomically replace a user's topic preferences. Delete-then-reinsert
    /// inside one transaction so a concurrent matcher pass never observes a
    /// half-written preference set.
    pub async fn update_preferences(&self, user_id: Uuid, topics: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM user_topics WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        for topic in topics {
            sqlx::query(
                "INSERT INTO user_topics (user_id, topic) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(topic)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    // --- Notifications ---

    pub async fn get_notified_ids(&self, user_id: Uuid) -> Result<HashSet<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT post_id FROM notifications WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    /// Conditionally record a notification. Returns true if this call created
    /// the record, false if the (user, post) pair was already marked by an
    /// earlier pass or a concurrent one. The primary key is the authoritative
    /// dedup guard; callers never need a read-then-write check.
    pub async fn mark_notified(&self, user_id: Uuid, post_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (user_id, post_id, sent_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, post_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Flip the read flag for one of the caller's notifications. The user id
    /// comes from the authenticated request context, never a process default.
    pub async fn mark_read(&self, user_id: Uuid, post_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE user_id = $1 AND post_id = $2",
        )
        .bind(user_id)
        .bind(post_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn get_notifications(&self, user_id: Uuid) -> Result<Vec<NotificationRecord>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY sent_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(NotificationRow::into_record).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    user_id: Uuid,
    post_id: String,
    sent_at: DateTime<Utc>,
    read: bool,
}

impl NotificationRow {
    fn into_record(self) -> NotificationRecord {
        NotificationRecord {
            user_id: self.user_id,
            post_id: self.post_id,
            sent_at: self.sent_at,
            read: self.read,
        }
    }
}
