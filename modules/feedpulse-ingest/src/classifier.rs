// Topic classification seam. The model itself is external; this core only
// sends text and reads back a label.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

#[async_trait]
pub trait TopicClassifier: Send + Sync {
    /// Classify a post's primary text into a topic label. A small closed
    /// label set (sport/politics/tech/entertainment/other) is expected but
    /// not enforced here.
    async fn classify(&self, text: &str) -> Result<String>;
}

/// Classifier backed by an HTTP classification service.
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    label: String,
}

impl HttpClassifier {
    pub fn new(endpoint: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TopicClassifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<String> {
        let body = serde_json::json!({ "text": text });

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            anyhow::bail!("Classifier error (status {}): {}", status.as_u16(), message);
        }

        let parsed: ClassifyResponse = resp.json().await?;
        Ok(parsed.label)
    }
}
