use serde_json::Value;
use thiserror::Error;

use crate::locator::Locator;

/// WebDriver key code for Enter.
pub const ENTER_KEY: &str = "\u{E007}";

/// Opaque reference to an element inside the live page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    pub id: String,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("network error: {0}")]
    Network(String),
    #[error("webdriver error {error}: {message}")]
    Command { error: String, message: String },
    #[error("unexpected webdriver response: {0}")]
    Protocol(String),
    #[error("browser session already closed")]
    Closed,
}

impl From<reqwest::Error> for DriverError {
    fn from(err: reqwest::Error) -> Self {
        DriverError::Network(err.to_string())
    }
}

/// Capability surface the scanner needs from a browser automation backend.
#[async_trait::async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    /// `Ok(None)` when nothing matches; errors are reserved for transport and
    /// protocol failures.
    async fn locate(&self, locator: &Locator) -> Result<Option<ElementHandle>, DriverError>;

    async fn locate_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, DriverError>;

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError>;

    async fn clear(&self, element: &ElementHandle) -> Result<(), DriverError>;

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError>;

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, DriverError>;

    async fn run_script(&self, script: &str, args: Vec<Value>) -> Result<Value, DriverError>;

    async fn page_source(&self) -> Result<String, DriverError>;

    async fn scroll_by(&self, pixels: i64) -> Result<(), DriverError> {
        self.run_script(
            "window.scrollBy(0, arguments[0]);",
            vec![Value::from(pixels)],
        )
        .await
        .map(|_| ())
    }

    async fn clear_session_state(&self) -> Result<(), DriverError>;

    /// Ends the browser session. Must be safe to call more than once.
    async fn quit(&self) -> Result<(), DriverError>;
}
