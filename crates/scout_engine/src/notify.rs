use std::time::Duration;

use scout_core::Post;
use scout_logging::scout_info;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("network error: {0}")]
    Network(String),
    #[error("notifier returned status {status}: {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Network(err.to_string())
    }
}

/// Downstream relevance classification and operator notification.
#[async_trait::async_trait]
pub trait LeadNotifier: Send + Sync {
    /// Keeps the posts that are relevant leads.
    async fn filter_posts(&self, posts: &[Post]) -> Result<Vec<Post>, NotifyError>;

    /// Tells the operator a second-factor code is needed at `location`.
    async fn notify(&self, location: &str) -> Result<(), NotifyError>;

    /// Sends the human-facing summary of relevant posts.
    async fn report(&self, posts: &[Post]) -> Result<(), NotifyError>;
}

/// Keeps every post and only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl LeadNotifier for LogNotifier {
    async fn filter_posts(&self, posts: &[Post]) -> Result<Vec<Post>, NotifyError> {
        Ok(posts.to_vec())
    }

    async fn notify(&self, location: &str) -> Result<(), NotifyError> {
        scout_info!("Second-factor code needed, enter it at {}", location);
        Ok(())
    }

    async fn report(&self, posts: &[Post]) -> Result<(), NotifyError> {
        for post in posts {
            scout_info!(
                "Lead by {} [{}]: {}",
                post.author,
                post.search_term.as_deref().unwrap_or("-"),
                post.text
            );
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct FilterResponse {
    posts: Vec<Post>,
}

/// JSON webhook service: `POST {base}/filter`, `/notify`, `/report`.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    base_url: String,
}

impl WebhookNotifier {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response, NotifyError> {
        let resp = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }
}

#[async_trait::async_trait]
impl LeadNotifier for WebhookNotifier {
    async fn filter_posts(&self, posts: &[Post]) -> Result<Vec<Post>, NotifyError> {
        let resp = self.post("filter", json!({ "posts": posts })).await?;
        let parsed: FilterResponse = resp.json().await?;
        Ok(parsed.posts)
    }

    async fn notify(&self, location: &str) -> Result<(), NotifyError> {
        self.post("notify", json!({ "location": location })).await?;
        Ok(())
    }

    async fn report(&self, posts: &[Post]) -> Result<(), NotifyError> {
        self.post("report", json!({ "posts": posts, "count": posts.len() }))
            .await?;
        Ok(())
    }
}
