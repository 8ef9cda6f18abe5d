//! Generic webhook channel.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::NotificationChannel;
use crate::notify::{NotifyError, RenewalOutcome};

/// Webhook channel configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Whether the channel is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Webhook URL.
    pub url: String,
    /// HTTP method, `POST` or `PUT`.
    #[serde(default = "default_method")]
    pub method: String,
    /// Extra headers.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Authentication.
    #[serde(default)]
    pub auth: Option<WebhookAuth>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

const fn default_enabled() -> bool {
    true
}

fn default_method() -> String {
    "POST".to_string()
}

const fn default_timeout() -> u64 {
    30
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("enabled", &self.enabled)
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &self.headers.len())
            .field("auth", &self.auth.as_ref().map(WebhookAuth::kind))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Webhook authentication.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WebhookAuth {
    /// `Authorization: Bearer <token>`.
    Bearer {
        /// Token.
        token: String,
    },
    /// HTTP basic authentication.
    Basic {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
    /// Arbitrary header.
    Header {
        /// Header name.
        name: String,
        /// Header value.
        value: String,
    },
}

impl WebhookAuth {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Bearer { .. } => "bearer",
            Self::Basic { .. } => "basic",
            Self::Header { .. } => "header",
        }
    }
}

/// Posts outcomes as JSON to an HTTP endpoint.
#[derive(Debug)]
pub struct WebhookChannel {
    config: WebhookConfig,
    headers: HeaderMap,
    client: Client,
}

impl WebhookChannel {
    /// Creates the channel.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Config`] for an unsupported method or a header
    /// that is not valid HTTP, and [`NotifyError::Http`] if the client cannot
    /// be built.
    pub fn new(config: WebhookConfig) -> Result<Self, NotifyError> {
        Self::with_builder(config, Client::builder())
    }

    fn with_builder(config: WebhookConfig, builder: ClientBuilder) -> Result<Self, NotifyError> {
        if config.url.trim().is_empty() {
            return Err(NotifyError::Config("webhook url is empty".into()));
        }
        let method = config.method.to_ascii_uppercase();
        if method != "POST" && method != "PUT" {
            return Err(NotifyError::Config(format!(
                "unsupported webhook method {}",
                config.method
            )));
        }

        let headers = build_headers(&config)?;
        let client = builder
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            headers,
            client,
        })
    }

    fn payload(outcome: &RenewalOutcome) -> serde_json::Value {
        json!({
            "event": "renewal",
            "subject": outcome.subject(),
            "account_id": outcome.account_id,
            "status": outcome.status,
            "success": outcome.is_success(),
            "message": outcome.message,
            "timestamp": outcome.timestamp_str(),
        })
    }
}

fn build_headers(config: &WebhookConfig) -> Result<HeaderMap, NotifyError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        insert_header(&mut headers, name, value)?;
    }

    match &config.auth {
        Some(WebhookAuth::Bearer { token }) => {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| NotifyError::Config("bearer token is not a valid header".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        Some(WebhookAuth::Header { name, value }) => insert_header(&mut headers, name, value)?,
        // Applied on the request builder.
        Some(WebhookAuth::Basic { .. }) | None => {}
    }
    Ok(headers)
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), NotifyError> {
    let name = name
        .parse::<HeaderName>()
        .map_err(|_| NotifyError::Config(format!("invalid header name {name:?}")))?;
    let value = value
        .parse::<HeaderValue>()
        .map_err(|_| NotifyError::Config(format!("invalid value for header {name}")))?;
    headers.insert(name, value);
    Ok(())
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn channel_type(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, outcome: &RenewalOutcome) -> Result<(), NotifyError> {
        let mut request = if self.config.method.eq_ignore_ascii_case("PUT") {
            self.client.put(&self.config.url)
        } else {
            self.client.post(&self.config.url)
        };

        request = request
            .headers(self.headers.clone())
            .json(&Self::payload(outcome));

        if let Some(WebhookAuth::Basic { username, password }) = &self.config.auth {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Webhook returned {status}");
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Webhook notification sent for account {}", outcome.account_id);
        Ok(())
    }
}
