//! W3C WebDriver wire types.

use serde::Deserialize;
use serde_json::{Value, json};

use super::WebDriverConfig;
use crate::error::Error;
use crate::page::Element;

/// Key under which element references are returned.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// The Enter key in the WebDriver key code space.
pub const ENTER: &str = "\u{E007}";

/// Every WebDriver response wraps its payload in `value`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub value: T,
}

/// Payload of a successful `POST /session`.
#[derive(Debug, Deserialize)]
pub struct NewSession {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Payload of an error response.
#[derive(Debug, Deserialize)]
pub struct ErrorValue {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl ErrorValue {
    pub fn into_error(self) -> Error {
        Error::webdriver(self.error, self.message)
    }
}

/// Builds the `POST /session` body for the configured browser.
pub fn new_session_body(config: &WebDriverConfig) -> Value {
    let mut args = config.args.clone();
    if config.headless && !args.iter().any(|a| a.starts_with("--headless")) {
        args.push("--headless=new".into());
    }

    let page_load_ms = config.page_load_timeout_secs.saturating_mul(1000);
    let mut always_match = json!({
        "browserName": config.browser,
        "timeouts": { "pageLoad": page_load_ms, "implicit": 0 },
    });

    let options_key = match config.browser.as_str() {
        "firefox" => Some("moz:firefoxOptions"),
        "chrome" | "chromium" => Some("goog:chromeOptions"),
        "MicrosoftEdge" | "msedge" => Some("ms:edgeOptions"),
        _ => None,
    };
    if let (Some(key), Value::Object(map)) = (options_key, &mut always_match) {
        map.insert(key.to_string(), json!({ "args": args }));
    }

    json!({ "capabilities": { "alwaysMatch": always_match } })
}

/// Body for `POST /session/{id}/elements`.
pub fn locate_body(selector: &str) -> Value {
    json!({ "using": "css selector", "value": selector })
}

/// Body for `POST /session/{id}/element/{id}/value`.
pub fn keys_body(text: &str) -> Value {
    json!({ "text": text })
}

/// Extracts element handles from a `find elements` payload.
pub fn element_refs(value: &Value) -> Result<Vec<Element>, Error> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::Protocol("expected an array of elements".into()))?;

    items
        .iter()
        .map(|item| {
            item.get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(Element::new)
                .ok_or_else(|| Error::Protocol("element reference without id".into()))
        })
        .collect()
}
