//! W3C WebDriver client.
//!
//! Talks to a chromedriver, geckodriver or Selenium endpoint over HTTP. Each
//! [`WebDriver::launch`] creates a fresh session, which is an isolated browser
//! profile; [`WebDriverSession::close`] deletes it again.

mod protocol;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::page::{Element, Launcher, Page};
use protocol::{Envelope, ErrorValue, NewSession};

/// Connection settings for the WebDriver endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    /// Base URL of the WebDriver endpoint.
    pub endpoint: String,
    /// Browser name requested in the session capabilities.
    pub browser: String,
    /// Run the browser without a visible window.
    pub headless: bool,
    /// Extra command-line arguments for the browser.
    pub args: Vec<String>,
    /// Page load timeout applied by the driver.
    pub page_load_timeout_secs: u64,
    /// Timeout for each HTTP request to the driver.
    pub request_timeout_secs: u64,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9515".into(),
            browser: "chrome".into(),
            headless: true,
            args: vec!["--no-sandbox".into(), "--disable-dev-shm-usage".into()],
            page_load_timeout_secs: 30,
            request_timeout_secs: 60,
        }
    }
}

/// Launches WebDriver sessions.
#[derive(Debug, Clone)]
pub struct WebDriver {
    config: WebDriverConfig,
    http: reqwest::Client,
}

impl WebDriver {
    /// Creates a launcher for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: WebDriverConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { config, http })
    }

    /// Returns the endpoint configuration.
    #[must_use]
    pub const fn config(&self) -> &WebDriverConfig {
        &self.config
    }
}

#[async_trait]
impl Launcher for WebDriver {
    type Page = WebDriverSession;

    async fn launch(&self) -> Result<WebDriverSession> {
        let endpoint = self.config.endpoint.trim_end_matches('/');
        let body = protocol::new_session_body(&self.config);
        let response = self
            .http
            .post(format!("{endpoint}/session"))
            .json(&body)
            .send()
            .await?;
        let session: NewSession = decode(response).await?;
        debug!("Started WebDriver session {}", session.session_id);

        Ok(WebDriverSession {
            http: self.http.clone(),
            base: format!("{endpoint}/session/{}", session.session_id),
            closed: false,
        })
    }
}

/// One live WebDriver session.
///
/// Dropping a session that was not closed schedules a best-effort
/// `DELETE /session` on the current runtime.
#[derive(Debug)]
pub struct WebDriverSession {
    http: reqwest::Client,
    base: String,
    closed: bool,
}

impl WebDriverSession {
    async fn command<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let mut request = self.http.request(method, format!("{}{path}", self.base));
        if let Some(body) = body {
            request = request.json(&body);
        }
        decode(request.send().await?).await
    }

    fn element_path(element: &Element, action: &str) -> String {
        format!("/element/{}/{action}", element.id())
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        return match serde_json::from_slice::<Envelope<ErrorValue>>(&bytes) {
            Ok(envelope) => Err(envelope.value.into_error()),
            Err(_) => Err(Error::Protocol(format!("HTTP {status} from WebDriver"))),
        };
    }

    let envelope: Envelope<T> = serde_json::from_slice(&bytes)?;
    Ok(envelope.value)
}

#[async_trait]
impl Page for WebDriverSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.command::<IgnoredAny>(Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String> {
        self.command(Method::GET, "/url", None).await
    }

    async fn find(&mut self, selector: &str) -> Result<Option<Element>> {
        let found: Value = self
            .command(
                Method::POST,
                "/elements",
                Some(protocol::locate_body(selector)),
            )
            .await?;
        Ok(protocol::element_refs(&found)?.into_iter().next())
    }

    async fn send_keys(&mut self, element: &Element, text: &str) -> Result<()> {
        let path = Self::element_path(element, "value");
        self.command::<IgnoredAny>(Method::POST, &path, Some(protocol::keys_body(text)))
            .await?;
        Ok(())
    }

    async fn submit(&mut self, element: &Element) -> Result<()> {
        self.send_keys(element, protocol::ENTER).await
    }

    async fn click(&mut self, element: &Element) -> Result<()> {
        let path = Self::element_path(element, "click");
        self.command::<IgnoredAny>(Method::POST, &path, Some(json!({})))
            .await?;
        Ok(())
    }

    async fn text(&mut self, element: &Element) -> Result<String> {
        let path = Self::element_path(element, "text");
        self.command(Method::GET, &path, None).await
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.command::<IgnoredAny>(Method::DELETE, "", None).await?;
        debug!("Closed WebDriver session");
        Ok(())
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("WebDriver session dropped outside a runtime; left for the driver to reap");
            return;
        };
        let request = self.http.delete(self.base.clone());
        handle.spawn(async move {
            if let Err(e) = request.send().await {
                warn!("Failed to delete abandoned WebDriver session: {e}");
            }
        });
    }
}
