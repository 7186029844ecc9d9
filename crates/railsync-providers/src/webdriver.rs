//! WebDriver-backed browsing session.
//!
//! This module implements [`BrowserSession`] over the W3C WebDriver wire
//! protocol, talking to a chromedriver endpoint with a headless Chromium.
//! Only the handful of commands the portal flow needs are implemented.

use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::browser::{BoxFuture, BrowserSession, ElementHandle, SessionFactory};
use crate::error::{ProviderError, ProviderResult};

/// W3C element identifier key in WebDriver responses.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// How often waits re-poll the page.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Configuration for the WebDriver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverConfig {
    /// Base URL of the WebDriver server (e.g. `http://localhost:9515`).
    pub endpoint: String,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Path to the browser binary, if not on the default lookup path.
    pub browser_binary: Option<String>,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9515".to_string(),
            request_timeout: Duration::from_secs(60),
            browser_binary: None,
        }
    }
}

/// A live WebDriver session.
#[derive(Debug)]
pub struct WebDriverSession {
    http_client: reqwest::Client,
    base_url: String,
    session_id: String,
}

impl WebDriverSession {
    /// Opens a new session with headless Chromium capabilities.
    pub async fn connect(config: &WebDriverConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ProviderError::internal(format!("failed to create HTTP client: {}", e)))?;

        let mut chrome_options = json!({
            "args": ["--headless", "--no-sandbox", "--disable-dev-shm-usage"],
        });
        if let Some(ref binary) = config.browser_binary {
            chrome_options["binary"] = json!(binary);
        }

        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": chrome_options,
                }
            }
        });

        let url = format!("{}/session", config.endpoint.trim_end_matches('/'));
        let response = http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let value = read_value(response).await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::invalid_response("session response without sessionId"))?
            .to_string();

        debug!(session_id = %session_id, "webdriver session opened");

        Ok(Self {
            http_client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            session_id,
        })
    }

    fn command_url(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.base_url, self.session_id, path)
    }

    async fn post(&self, path: &str, body: Value) -> ProviderResult<Value> {
        let response = self
            .http_client
            .post(self.command_url(path))
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_value(response).await
    }

    async fn get(&self, path: &str) -> ProviderResult<Value> {
        let response = self
            .http_client
            .get(self.command_url(path))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_value(response).await
    }

    async fn find_with(
        &self,
        using: &str,
        value: &str,
    ) -> ProviderResult<Option<ElementHandle>> {
        let result = self
            .post("/element", json!({ "using": using, "value": value }))
            .await;
        match result {
            Ok(found) => Ok(Some(parse_element(&found)?)),
            Err(e) if e.code() == crate::error::ProviderErrorCode::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn find_all(&self, using: &str, value: &str) -> ProviderResult<Vec<ElementHandle>> {
        let found = self
            .post("/elements", json!({ "using": using, "value": value }))
            .await?;
        let items = found
            .as_array()
            .ok_or_else(|| ProviderError::invalid_response("elements response is not an array"))?;
        items.iter().map(parse_element).collect()
    }

    async fn wait_with(
        &self,
        using: &str,
        value: &str,
        timeout: Duration,
        what: &str,
    ) -> ProviderResult<ElementHandle> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(handle) = self.find_with(using, value).await? {
                return Ok(handle);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ProviderError::navigation_timeout(format!(
                    "{} `{}` never appeared",
                    what, value
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

impl BrowserSession for WebDriverSession {
    fn navigate(&self, url: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let url = url.to_string();
        Box::pin(async move {
            self.post("/url", json!({ "url": url })).await?;
            Ok(())
        })
    }

    fn current_url(&self) -> BoxFuture<'_, ProviderResult<String>> {
        Box::pin(async move {
            let value = self.get("/url").await?;
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| ProviderError::invalid_response("url response is not a string"))
        })
    }

    fn page_source(&self) -> BoxFuture<'_, ProviderResult<String>> {
        Box::pin(async move {
            let value = self.get("/source").await?;
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| ProviderError::invalid_response("source response is not a string"))
        })
    }

    fn find(&self, selector: &str) -> BoxFuture<'_, ProviderResult<Option<ElementHandle>>> {
        let selector = selector.to_string();
        Box::pin(async move { self.find_with("css selector", &selector).await })
    }

    fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> BoxFuture<'_, ProviderResult<ElementHandle>> {
        let selector = selector.to_string();
        Box::pin(async move {
            self.wait_with("css selector", &selector, timeout, "element")
                .await
        })
    }

    fn wait_for_link(
        &self,
        text: &str,
        timeout: Duration,
    ) -> BoxFuture<'_, ProviderResult<ElementHandle>> {
        let text = text.to_string();
        Box::pin(async move {
            self.wait_with("partial link text", &text, timeout, "link")
                .await
        })
    }

    fn click(&self, element: &ElementHandle) -> BoxFuture<'_, ProviderResult<()>> {
        let path = format!("/element/{}/click", element.id());
        Box::pin(async move {
            self.post(&path, json!({})).await?;
            Ok(())
        })
    }

    fn send_keys(&self, element: &ElementHandle, text: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let path = format!("/element/{}/value", element.id());
        let text = text.to_string();
        Box::pin(async move {
            self.post(&path, json!({ "text": text })).await?;
            Ok(())
        })
    }

    fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> BoxFuture<'_, ProviderResult<Option<String>>> {
        let path = format!(
            "/element/{}/attribute/{}",
            element.id(),
            urlencoding::encode(name)
        );
        Box::pin(async move {
            let value = self.get(&path).await?;
            Ok(value.as_str().map(str::to_string))
        })
    }

    fn select_values(&self, selector: &str) -> BoxFuture<'_, ProviderResult<Vec<String>>> {
        let option_selector = format!("{} option", selector);
        Box::pin(async move {
            let options = self.find_all("css selector", &option_selector).await?;
            let mut values = Vec::with_capacity(options.len());
            for option in &options {
                let path = format!("/element/{}/attribute/value", option.id());
                let value = self.get(&path).await?;
                values.push(value.as_str().unwrap_or_default().to_string());
            }
            Ok(values)
        })
    }

    fn select_by_value(&self, selector: &str, value: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let option_selector = format!("{} option[value=\"{}\"]", selector, value);
        Box::pin(async move {
            let option = self
                .find_with("css selector", &option_selector)
                .await?
                .ok_or_else(|| {
                    ProviderError::navigation_timeout(format!(
                        "select option `{}` not present",
                        option_selector
                    ))
                })?;
            let path = format!("/element/{}/click", option.id());
            self.post(&path, json!({})).await?;
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            let response = self
                .http_client
                .delete(self.command_url(""))
                .send()
                .await
                .map_err(map_reqwest_error)?;
            if !response.status().is_success() {
                warn!(status = %response.status(), "webdriver session delete returned error");
            }
            debug!(session_id = %self.session_id, "webdriver session closed");
            Ok(())
        })
    }
}

/// Opens [`WebDriverSession`]s for the fetch retry loop.
#[derive(Debug, Clone)]
pub struct WebDriverFactory {
    config: WebDriverConfig,
}

impl WebDriverFactory {
    /// Creates a factory for the given endpoint configuration.
    pub fn new(config: WebDriverConfig) -> Self {
        Self { config }
    }
}

impl SessionFactory for WebDriverFactory {
    fn open(&self) -> BoxFuture<'_, ProviderResult<Box<dyn BrowserSession>>> {
        Box::pin(async move {
            let session = WebDriverSession::connect(&self.config).await?;
            Ok(Box::new(session) as Box<dyn BrowserSession>)
        })
    }
}

/// Maps a reqwest failure onto the session taxonomy.
fn map_reqwest_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::transport("webdriver request timeout").with_source(e)
    } else if e.is_connect() {
        ProviderError::transport("webdriver connection failed").with_source(e)
    } else {
        ProviderError::transport("webdriver request failed").with_source(e)
    }
}

/// Unwraps the WebDriver `{"value": ...}` envelope, mapping protocol errors.
async fn read_value(response: reqwest::Response) -> ProviderResult<Value> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| ProviderError::invalid_response(format!("bad webdriver body: {}", e)))?;
    let value = body.get("value").cloned().unwrap_or(Value::Null);

    if status.is_success() {
        return Ok(value);
    }

    let error = value.get("error").and_then(Value::as_str).unwrap_or("");
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("webdriver error");

    match error {
        "no such element" => Err(ProviderError::not_found(message)),
        "invalid session id" | "session not created" => Err(ProviderError::transport(message)),
        "timeout" | "script timeout" => Err(ProviderError::navigation_timeout(message)),
        _ => Err(ProviderError::invalid_response(format!(
            "webdriver error `{}`: {}",
            error, message
        ))),
    }
}

/// Extracts the element id from a WebDriver element object.
fn parse_element(value: &Value) -> ProviderResult<ElementHandle> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(ElementHandle::new)
        .ok_or_else(|| ProviderError::invalid_response("response without element id"))
}
