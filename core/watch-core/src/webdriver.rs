//! Production renderer: a W3C WebDriver client over blocking HTTP.
//!
//! Talks to a locally running driver (chromedriver by default). Each fetch
//! attempt opens its own browser session and deletes it on drop.
//!
//! ## Failure mapping
//!
//! | Condition                              | RenderError   |
//! |----------------------------------------|---------------|
//! | driver not listening                   | `Unavailable` |
//! | `session not created`, browser missing or wrong version | `Unavailable` |
//! | other `session not created` (e.g. stale profile lock)   | `Protocol`    |
//! | HTTP timeout, `timeout`/`script timeout` | `Timeout`   |
//! | any other WebDriver error              | `Protocol`    |

use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::WatchConfig;
use crate::error::RenderError;
use crate::renderer::{Automation, ElementHandle, Renderer};

/// W3C element reference key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const HTTP_TIMEOUT: Duration = Duration::from_secs(120);
const PAGE_LOAD_TIMEOUT_MS: u64 = 90_000;
const SCRIPT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct WebDriverAutomation {
    endpoint: String,
    headless: bool,
    user_agent: String,
    window: (u32, u32),
    profile_dir: Option<PathBuf>,
}

impl WebDriverAutomation {
    pub fn new(config: &WatchConfig, profile_dir: Option<PathBuf>) -> Self {
        Self {
            endpoint: config.webdriver_url.trim_end_matches('/').to_string(),
            headless: config.headless,
            user_agent: config.user_agent.clone(),
            window: (config.window_width, config.window_height),
            profile_dir,
        }
    }

    fn capabilities(&self) -> Value {
        let mut args = vec![
            "--disable-blink-features=AutomationControlled".to_string(),
            "--lang=en-US".to_string(),
            format!("--user-agent={}", self.user_agent),
            format!("--window-size={},{}", self.window.0, self.window.1),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        if let Some(dir) = &self.profile_dir {
            args.push(format!("--user-data-dir={}", dir.display()));
        }

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "pageLoadStrategy": "eager",
                    "timeouts": {
                        "pageLoad": PAGE_LOAD_TIMEOUT_MS,
                        "script": SCRIPT_TIMEOUT_MS,
                        "implicit": 0
                    },
                    "goog:chromeOptions": {
                        "args": args,
                        "excludeSwitches": ["enable-automation"]
                    }
                }
            }
        })
    }
}

impl Automation for WebDriverAutomation {
    type Session = WebDriverSession;

    fn open(&self) -> Result<WebDriverSession, RenderError> {
        if let Some(dir) = &self.profile_dir {
            if let Err(err) = fs_err::create_dir_all(dir) {
                warn!(error = %err, "Failed to create browser profile directory");
            }
        }

        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| RenderError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        let value = send(
            &client,
            Method::POST,
            &format!("{}/session", self.endpoint),
            Some(self.capabilities()),
        )
        .map_err(new_session_error)?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| RenderError::Protocol("new session response missing sessionId".to_string()))?;
        debug!(session_id, endpoint = %self.endpoint, "WebDriver session opened");

        Ok(WebDriverSession {
            client,
            base: format!("{}/session/{}", self.endpoint, session_id),
            open: true,
        })
    }
}

pub struct WebDriverSession {
    client: Client,
    base: String,
    open: bool,
}

impl WebDriverSession {
    fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, RenderError> {
        send(&self.client, method, &format!("{}{}", self.base, path), body)
    }

    fn find(&self, using: &str, value: &str) -> Result<Vec<ElementHandle>, RenderError> {
        let found = self.command(
            Method::POST,
            "/elements",
            Some(json!({ "using": using, "value": value })),
        )?;
        parse_elements(&found)
    }

    /// Deletes the browser session. Idempotent.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(err) = self.command(Method::DELETE, "", None) {
            warn!(error = %err, "Failed to close WebDriver session");
        }
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl Renderer for WebDriverSession {
    fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))?;
        Ok(())
    }

    fn body_text(&mut self) -> Result<String, RenderError> {
        let body = self
            .find("css selector", "body")?
            .into_iter()
            .next()
            .ok_or_else(|| RenderError::Protocol("page has no body".to_string()))?;
        self.text(&body)
    }

    fn find_by_text(&mut self, text: &str) -> Result<Vec<ElementHandle>, RenderError> {
        let xpath = format!("//*[normalize-space(text())={}]", xpath_literal(text));
        self.find("xpath", &xpath)
    }

    fn find_by_css(&mut self, selector: &str) -> Result<Vec<ElementHandle>, RenderError> {
        self.find("css selector", selector)
    }

    fn attribute(&mut self, element: &ElementHandle, name: &str) -> Result<Option<String>, RenderError> {
        let value = self.command(
            Method::GET,
            &format!("/element/{}/attribute/{}", element.id(), name),
            None,
        )?;
        Ok(value.as_str().map(str::to_string))
    }

    fn text(&mut self, element: &ElementHandle) -> Result<String, RenderError> {
        let value = self.command(Method::GET, &format!("/element/{}/text", element.id()), None)?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn click(&mut self, element: &ElementHandle) -> Result<(), RenderError> {
        self.command(Method::POST, &format!("/element/{}/click", element.id()), Some(json!({})))?;
        Ok(())
    }

    fn wait(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

fn send(client: &Client, method: Method, url: &str, body: Option<Value>) -> Result<Value, RenderError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().map_err(transport_error)?;
    let status = response.status();
    let payload: Value = response
        .json()
        .map_err(|e| RenderError::Protocol(format!("invalid WebDriver response ({}): {}", status, e)))?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if status.is_success() {
        Ok(value)
    } else {
        Err(command_error(&value))
    }
}

fn transport_error(err: reqwest::Error) -> RenderError {
    if err.is_connect() {
        RenderError::Unavailable(format!("WebDriver endpoint not reachable: {}", err))
    } else if err.is_timeout() {
        RenderError::Timeout(err.to_string())
    } else {
        RenderError::Protocol(err.to_string())
    }
}

fn command_error(value: &Value) -> RenderError {
    let error = value.get("error").and_then(Value::as_str).unwrap_or("unknown error");
    let message = value.get("message").and_then(Value::as_str).unwrap_or_default();
    let text = if message.is_empty() {
        error.to_string()
    } else {
        format!("{}: {}", error, message)
    };

    match error {
        "timeout" | "script timeout" => RenderError::Timeout(text),
        _ => RenderError::Protocol(text),
    }
}

fn parse_elements(value: &Value) -> Result<Vec<ElementHandle>, RenderError> {
    let items = value
        .as_array()
        .ok_or_else(|| RenderError::Protocol("find elements did not return a list".to_string()))?;

    items
        .iter()
        .map(|item| {
            item.get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(ElementHandle::new)
                .ok_or_else(|| RenderError::Protocol("element reference missing id".to_string()))
        })
        .collect()
}

/// Quotes `text` as an XPath 1.0 string literal.
fn xpath_literal(text: &str) -> String {
    if !text.contains('"') {
        format!("\"{}\"", text)
    } else if !text.contains('\'') {
        format!("'{}'", text)
    } else {
        let parts: Vec<String> = text.split('"').map(|part| format!("\"{}\"", part)).collect();
        format!("concat({})", parts.join(", '\"', "))
    }
}

/// Browser startup failures that no retry will fix.
const SETUP_FAILURE_MARKERS: &[&str] = &[
    "cannot find chrome binary",
    "no chrome binary",
    "only supports chrome version",
    "binary is not a chrome",
];

/// Only a missing or mismatched browser is a setup defect; chromedriver also
/// reports transient launch failures as `session not created`.
fn new_session_error(err: RenderError) -> RenderError {
    match err {
        RenderError::Protocol(message) if message.starts_with("session not created") => {
            let lowered = message.to_lowercase();
            if SETUP_FAILURE_MARKERS.iter().any(|marker| lowered.contains(marker)) {
                RenderError::Unavailable(message)
            } else {
                RenderError::Protocol(message)
            }
        }
        other => other,
    }
}
