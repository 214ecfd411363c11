//! Out-of-band second-factor relay.
//!
//! A remotely editable slot is created with a placeholder, the operator is
//! told where it lives, and the slot is polled on a fixed cadence until a
//! code shows up or the attempts run out. The slot is single-use and is
//! always deleted before `request_code` returns.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use scout_core::{find_code, CODE_PLACEHOLDER};
use scout_logging::{scout_debug, scout_error, scout_info, scout_warn};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::notify::LeadNotifier;

pub const GIST_FILENAME: &str = "nextdoor_2fa_code.txt";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("network error: {0}")]
    Network(String),
    #[error("relay store returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("relay slot content missing: {0}")]
    MissingContent(String),
    #[error("operator notification failed: {0}")]
    Notify(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::Network(err.to_string())
    }
}

/// Where a created slot lives: `id` for the API, `location` for humans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayHandle {
    pub id: String,
    pub location: String,
}

#[async_trait::async_trait]
pub trait RelayStore: Send + Sync {
    async fn create(&self, content: &str) -> Result<RelayHandle, RelayError>;
    async fn read(&self, handle: &RelayHandle) -> Result<String, RelayError>;
    async fn delete(&self, handle: &RelayHandle) -> Result<(), RelayError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    pub poll_interval_secs: u64,
    pub max_attempts: u32,
    pub api_base: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            max_attempts: 6,
            api_base: "https://api.github.com".to_string(),
        }
    }
}

impl RelaySettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// The live slot of one second-factor exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRelayToken {
    pub id: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct AuthRelay {
    store: Arc<dyn RelayStore>,
    notifier: Arc<dyn LeadNotifier>,
    poll_interval: Duration,
    max_attempts: u32,
}

impl AuthRelay {
    pub fn new(
        store: Arc<dyn RelayStore>,
        notifier: Arc<dyn LeadNotifier>,
        poll_interval: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            notifier,
            poll_interval,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_settings(
        store: Arc<dyn RelayStore>,
        notifier: Arc<dyn LeadNotifier>,
        settings: &RelaySettings,
    ) -> Self {
        Self::new(store, notifier, settings.poll_interval(), settings.max_attempts)
    }

    /// Longest time `request_code` may spend waiting between polls.
    pub fn wait_window(&self) -> Duration {
        self.poll_interval * self.max_attempts
    }

    /// Returns the code, `Ok(None)` when the window closed without one, or an
    /// error when the slot could not be created or the operator not notified.
    ///
    /// The slot is deleted on every path, including when this future is
    /// dropped mid-poll.
    pub async fn request_code(&self) -> Result<Option<String>, RelayError> {
        let created_at = Utc::now();
        let content = slot_content(&created_at);
        let handle = self.store.create(&content).await?;
        let slot = LiveSlot::new(self.store.clone(), handle);
        let token = AuthRelayToken {
            id: slot.handle().id.clone(),
            location: slot.handle().location.clone(),
            created_at,
            expires_at: created_at
                + chrono::Duration::from_std(self.wait_window()).unwrap_or(chrono::Duration::zero()),
        };
        scout_info!(
            "Created relay slot {} (expires {})",
            token.location,
            token.expires_at.format("%H:%M:%S")
        );

        if let Err(err) = self.notifier.notify(&token.location).await {
            slot.discard().await;
            return Err(RelayError::Notify(err.to_string()));
        }

        let ignored: Vec<&str> = content.lines().collect();
        let code = self.poll(slot.handle(), &ignored).await;
        slot.discard().await;
        Ok(code)
    }

    async fn poll(&self, handle: &RelayHandle, ignored: &[&str]) -> Option<String> {
        for attempt in 1..=self.max_attempts {
            match self.store.read(handle).await {
                Ok(content) => {
                    if let Some(code) = find_code(&content, ignored) {
                        scout_info!("Second-factor code received on attempt {}", attempt);
                        return Some(code);
                    }
                }
                Err(err) => scout_warn!("Relay poll {} failed: {}", attempt, err),
            }
            if attempt < self.max_attempts {
                let remaining = self.poll_interval * (self.max_attempts - attempt);
                scout_info!(
                    "Attempt {}/{} - waiting for code ({}s remaining)",
                    attempt,
                    self.max_attempts,
                    remaining.as_secs()
                );
                tokio::time::sleep(self.poll_interval).await;
            }
        }
        scout_warn!(
            "No second-factor code after {} attempts",
            self.max_attempts
        );
        None
    }
}

/// A created slot that still has to be deleted. Dropping it without
/// [`LiveSlot::discard`] hands the deletion to the runtime.
struct LiveSlot {
    store: Arc<dyn RelayStore>,
    handle: RelayHandle,
    live: bool,
}

impl LiveSlot {
    fn new(store: Arc<dyn RelayStore>, handle: RelayHandle) -> Self {
        Self {
            store,
            handle,
            live: true,
        }
    }

    fn handle(&self) -> &RelayHandle {
        &self.handle
    }

    async fn discard(mut self) {
        self.live = false;
        delete_slot(self.store.as_ref(), &self.handle).await;
    }
}

impl Drop for LiveSlot {
    fn drop(&mut self) {
        if !self.live {
            return;
        }
        scout_warn!("Relay exchange abandoned, deleting slot {}", self.handle.id);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let store = self.store.clone();
                let handle = self.handle.clone();
                runtime.spawn(async move {
                    delete_slot(store.as_ref(), &handle).await;
                });
            }
            Err(_) => scout_error!(
                "No runtime to delete relay slot {}; remove it at {}",
                self.handle.id,
                self.handle.location
            ),
        }
    }
}

async fn delete_slot(store: &dyn RelayStore, handle: &RelayHandle) {
    match store.delete(handle).await {
        Ok(()) => scout_debug!("Deleted relay slot {}", handle.id),
        Err(err) => scout_warn!("Failed to delete relay slot {}: {}", handle.id, err),
    }
}

fn slot_content(created_at: &DateTime<Utc>) -> String {
    format!(
        "{CODE_PLACEHOLDER}\n\nInstructions:\n\
1. Replace \"{CODE_PLACEHOLDER}\" above with your 6-digit verification code\n\
2. Save\n\
3. The scanner will detect the code and continue\n\n\
Created: {}\n\
This slot is deleted automatically after use.\n",
        created_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Private GitHub gist holding a single text file.
#[derive(Debug, Clone)]
pub struct GistRelayStore {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl GistRelayStore {
    pub fn new(api_base: &str, token: &str) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("lead-scout")
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_base, path))
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
    }
}

#[derive(Debug, Deserialize)]
struct GistFile {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GistResponse {
    id: String,
    html_url: Option<String>,
    #[serde(default)]
    files: std::collections::HashMap<String, GistFile>,
}

async fn api_error(resp: reqwest::Response) -> RelayError {
    let status = resp.status().as_u16();
    let message = resp.text().await.unwrap_or_default();
    RelayError::Api { status, message }
}

#[async_trait::async_trait]
impl RelayStore for GistRelayStore {
    async fn create(&self, content: &str) -> Result<RelayHandle, RelayError> {
        let mut files = serde_json::Map::new();
        files.insert(GIST_FILENAME.to_string(), json!({ "content": content }));
        let description = format!(
            "Verification code input - {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
        let body = json!({
            "description": description,
            "public": false,
            "files": files,
        });
        let resp = self
            .request(reqwest::Method::POST, "/gists")
            .json(&body)
            .send()
            .await?;
        if resp.status().as_u16() != 201 {
            return Err(api_error(resp).await);
        }
        let gist: GistResponse = resp.json().await?;
        let location = gist
            .html_url
            .unwrap_or_else(|| format!("https://gist.github.com/{}", gist.id));
        Ok(RelayHandle {
            id: gist.id,
            location,
        })
    }

    async fn read(&self, handle: &RelayHandle) -> Result<String, RelayError> {
        let resp = self
            .request(reqwest::Method::GET, &format!("/gists/{}", handle.id))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }
        let mut gist: GistResponse = resp.json().await?;
        gist.files
            .remove(GIST_FILENAME)
            .and_then(|file| file.content)
            .ok_or_else(|| RelayError::MissingContent(handle.id.clone()))
    }

    async fn delete(&self, handle: &RelayHandle) -> Result<(), RelayError> {
        let resp = self
            .request(reqwest::Method::DELETE, &format!("/gists/{}", handle.id))
            .send()
            .await?;
        if resp.status().as_u16() != 204 {
            return Err(api_error(resp).await);
        }
        Ok(())
    }
}
