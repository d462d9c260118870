pub mod error;
pub mod types;

pub use error::{ApifyError, Result};
pub use types::{
    ApiResponse, FacebookItem, FacebookScraperInput, InstagramComment, InstagramItem,
    InstagramScraperInput, RunData, StartUrl, XAuthor, XItem, XScraperInput,
};

use serde::Serialize;

const BASE_URL: &str = "https://api.apify.com/v2";

/// Actor ID for apify/instagram-post-scraper.
const INSTAGRAM_POST_SCRAPER: &str = "nH2AHrwxeTRJoN5hX";

/// Actor ID for apify/facebook-posts-scraper.
const FACEBOOK_POSTS_SCRAPER: &str = "KoJrdxJCTtpon81KY";

/// Actor ID for apidojo/tweet-scraper.
const TWEET_SCRAPER: &str = "61RPP7dywgiy0JPD0";

pub struct ApifyClient {
    client: reqwest::Client,
    token: String,
}

impl ApifyClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
        }
    }

    /// Start an actor run. Returns immediately with run metadata; the dataset
    /// materializes later and is fetched separately by dataset id.
    pub async fn start_run<I: Serialize>(&self, actor_id: &str, input: &I) -> Result<RunData> {
        let url = format!("{}/acts/{}/runs", BASE_URL, actor_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let api_resp: ApiResponse<RunData> = resp.json().await?;
        Ok(api_resp.data)
    }

    /// Fetch a run's current metadata. Uses `waitForFinish=60` so a run that
    /// is about to finish resolves in one round-trip.
    pub async fn get_run(&self, run_id: &str) -> Result<RunData> {
        let url = format!("{}/actor-runs/{}?waitForFinish=60", BASE_URL, run_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let api_resp: ApiResponse<RunData> = resp.json().await?;
        Ok(api_resp.data)
    }

    /// Poll until a run reaches a terminal status.
    pub async fn wait_for_run(&self, run_id: &str) -> Result<RunData> {
        loop {
            let run = self.get_run(run_id).await?;
            match run.status.as_str() {
                "SUCCEEDED" => return Ok(run),
                "FAILED" | "ABORTED" | "TIMED-OUT" => {
                    return Err(ApifyError::RunFailed(run.status));
                }
                _ => {
                    tracing::debug!(run_id, status = %run.status, "Run still in progress");
                    continue;
                }
            }
        }
    }

    /// Fetch dataset items as raw JSON. The item shape is actor-specific;
    /// callers decode the fields they care about.
    pub async fn fetch_dataset_items(&self, dataset_id: &str) -> Result<Vec<serde_json::Value>> {
        let url = format!("{}/datasets/{}/items?format=json", BASE_URL, dataset_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let items: Vec<serde_json::Value> = resp.json().await?;
        Ok(items)
    }

    /// Start an Instagram profile scrape run.
    pub async fn start_instagram_scrape(&self, username: &str, limit: u32) -> Result<RunData> {
        tracing::info!(username, limit, "Starting Instagram profile scrape");
        let input = InstagramScraperInput {
            username: vec![username.to_string()],
            results_limit: limit,
        };
        self.start_run(INSTAGRAM_POST_SCRAPER, &input).await
    }

    /// Start a Facebook page scrape run.
    pub async fn start_facebook_scrape(&self, page_url: &str, limit: u32) -> Result<RunData> {
        tracing::info!(page_url, limit, "Starting Facebook page scrape");
        let input = FacebookScraperInput {
            start_urls: vec![StartUrl {
                url: page_url.to_string(),
            }],
            results_limit: limit,
        };
        self.start_run(FACEBOOK_POSTS_SCRAPER, &input).await
    }

    /// Start an X/Twitter profile scrape run.
    pub async fn start_x_scrape(&self, handle: &str, limit: u32) -> Result<RunData> {
        tracing::info!(handle, limit, "Starting X/Twitter scrape");
        let input = XScraperInput {
            twitter_handles: vec![handle.to_string()],
            max_items: limit,
        };
        self.start_run(TWEET_SCRAPER, &input).await
    }
}
