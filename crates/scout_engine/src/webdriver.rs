//! [`BrowserDriver`] over the W3C WebDriver HTTP protocol (chromedriver,
//! geckodriver, Selenium Grid).

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::Method;
use scout_logging::{scout_debug, scout_info, scout_warn};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::driver::{BrowserDriver, DriverError, ElementHandle};
use crate::locator::Locator;

/// Key under which W3C WebDriver returns element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52f-4a5c8b60b4e9";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WebDriverSettings {
    pub endpoint: String,
    pub headless: bool,
    pub user_agent: String,
    pub implicit_wait_ms: u64,
    pub request_timeout_secs: u64,
    pub extra_args: Vec<String>,
}

impl Default for WebDriverSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9515".to_string(),
            headless: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            implicit_wait_ms: 1_000,
            request_timeout_secs: 60,
            extra_args: Vec::new(),
        }
    }
}

impl WebDriverSettings {
    fn chrome_args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-gpu",
            "--disable-blink-features=AutomationControlled",
            "--disable-extensions",
            "--disable-plugins",
            "--disable-default-apps",
            "--disable-sync",
            "--no-first-run",
            "--no-default-browser-check",
            "--disable-notifications",
        ]
        .iter()
        .map(|arg| arg.to_string())
        .collect();
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args.push(format!("--user-agent={}", self.user_agent));
        args.extend(self.extra_args.iter().cloned());
        args
    }

    fn capabilities(&self) -> Value {
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": self.chrome_args(),
                        "excludeSwitches": ["enable-automation"],
                        "prefs": {
                            "profile.default_content_setting_values.notifications": 2
                        }
                    }
                }
            }
        })
    }
}

pub struct WebDriverClient {
    http: reqwest::Client,
    endpoint: String,
    session_id: String,
    closed: AtomicBool,
}

impl WebDriverClient {
    /// Starts a new browser session, sets the implicit wait and clears cookies.
    pub async fn connect(settings: &WebDriverSettings) -> Result<Self, DriverError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        let endpoint = settings.endpoint.trim_end_matches('/').to_string();

        let resp = http
            .post(format!("{endpoint}/session"))
            .json(&settings.capabilities())
            .send()
            .await?;
        let value = unwrap_response(resp).await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::Protocol("new session response without sessionId".into()))?
            .to_string();
        scout_info!("WebDriver session {} started at {}", session_id, endpoint);

        let client = Self {
            http,
            endpoint,
            session_id,
            closed: AtomicBool::new(false),
        };
        if let Err(err) = client.prepare(settings).await {
            scout_warn!("WebDriver session {} setup failed: {}", client.session_id, err);
            if let Err(quit_err) = client.quit().await {
                scout_warn!("Could not close half-started session: {}", quit_err);
            }
            return Err(err);
        }
        Ok(client)
    }

    async fn prepare(&self, settings: &WebDriverSettings) -> Result<(), DriverError> {
        self.command(
            Method::POST,
            "/timeouts",
            Some(json!({ "implicit": settings.implicit_wait_ms })),
        )
        .await?;
        self.clear_session_state().await
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, DriverError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DriverError::Closed);
        }
        let url = format!("{}/session/{}{}", self.endpoint, self.session_id, path);
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        unwrap_response(request.send().await?).await
    }

    async fn element_command(
        &self,
        method: Method,
        element: &ElementHandle,
        suffix: &str,
        body: Option<Value>,
    ) -> Result<Value, DriverError> {
        self.command(method, &format!("/element/{}{}", element.id, suffix), body)
            .await
    }
}

/// Extracts `value` from a WebDriver response, mapping error payloads.
async fn unwrap_response(resp: reqwest::Response) -> Result<Value, DriverError> {
    let status = resp.status();
    let body: Value = resp
        .json()
        .await
        .map_err(|err| DriverError::Protocol(format!("status {status}: {err}")))?;
    let value = body.get("value").cloned().unwrap_or(Value::Null);
    if status.is_success() {
        return Ok(value);
    }
    let error = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Err(DriverError::Command { error, message })
}

fn element_from(value: &Value) -> Result<ElementHandle, DriverError> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(ElementHandle::new)
        .ok_or_else(|| DriverError::Protocol(format!("not an element reference: {value}")))
}

fn locator_body(locator: &Locator) -> Value {
    let (using, value) = locator.to_webdriver();
    json!({ "using": using, "value": value })
}

fn is_no_such_element(err: &DriverError) -> bool {
    matches!(err, DriverError::Command { error, .. } if error == "no such element")
}

#[async_trait::async_trait]
impl BrowserDriver for WebDriverClient {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        scout_debug!("Navigating to {}", url);
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        let value = self.command(Method::GET, "/url", None).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DriverError::Protocol(format!("url is not a string: {value}")))
    }

    async fn locate(&self, locator: &Locator) -> Result<Option<ElementHandle>, DriverError> {
        match self
            .command(Method::POST, "/element", Some(locator_body(locator)))
            .await
        {
            Ok(value) => element_from(&value).map(Some),
            Err(err) if is_no_such_element(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn locate_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, DriverError> {
        let value = self
            .command(Method::POST, "/elements", Some(locator_body(locator)))
            .await?;
        value
            .as_array()
            .ok_or_else(|| DriverError::Protocol(format!("elements is not an array: {value}")))?
            .iter()
            .map(element_from)
            .collect()
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.element_command(Method::POST, element, "/click", Some(json!({})))
            .await
            .map(|_| ())
    }

    async fn clear(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.element_command(Method::POST, element, "/clear", Some(json!({})))
            .await
            .map(|_| ())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        self.element_command(Method::POST, element, "/value", Some(json!({ "text": text })))
            .await
            .map(|_| ())
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let value = self
            .element_command(Method::GET, element, &format!("/attribute/{name}"), None)
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, DriverError> {
        let value = self
            .element_command(Method::GET, element, "/displayed", None)
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn run_script(&self, script: &str, args: Vec<Value>) -> Result<Value, DriverError> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        let value = self.command(Method::GET, "/source", None).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DriverError::Protocol("page source is not a string".into()))
    }

    async fn clear_session_state(&self) -> Result<(), DriverError> {
        self.command(Method::DELETE, "/cookie", None).await.map(|_| ())
    }

    async fn quit(&self) -> Result<(), DriverError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let url = format!("{}/session/{}", self.endpoint, self.session_id);
        let resp = self.http.delete(url).send().await;
        match resp {
            Ok(resp) => {
                unwrap_response(resp).await?;
                scout_info!("WebDriver session {} closed", self.session_id);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
