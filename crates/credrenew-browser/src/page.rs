//! Abstraction over the remote interactive surface.
//!
//! The login flow only needs a handful of primitives: navigate, look up an
//! element by CSS selector, type into it, submit it, click it and read the
//! current location. [`Page`] captures exactly those so the flow can run
//! against a real WebDriver session or a scripted page in tests.

use async_trait::async_trait;

use crate::error::Result;

/// Opaque handle to an element on the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element(String);

impl Element {
    /// Creates an element handle from a transport-specific id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the transport-specific id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// One open browser page.
#[async_trait]
pub trait Page: Send {
    /// Navigates to `url` and waits for the load to finish.
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Returns the URL currently displayed.
    async fn current_url(&mut self) -> Result<String>;

    /// Looks up the first element matching `selector`.
    ///
    /// Returns `Ok(None)` when nothing matches; this call never waits.
    async fn find(&mut self, selector: &str) -> Result<Option<Element>>;

    /// Sends keystrokes to an element.
    async fn send_keys(&mut self, element: &Element, text: &str) -> Result<()>;

    /// Presses Enter on an element.
    async fn submit(&mut self, element: &Element) -> Result<()>;

    /// Clicks an element.
    async fn click(&mut self, element: &Element) -> Result<()>;

    /// Returns the rendered text of an element.
    async fn text(&mut self, element: &Element) -> Result<String>;

    /// Releases the underlying browser session.
    async fn close(&mut self) -> Result<()>;
}

/// Starts browser sessions.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Page type produced by this launcher.
    type Page: Page;

    /// Opens a fresh, isolated browser session.
    async fn launch(&self) -> Result<Self::Page>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_element_id() {
        let element = Element::new("abc-123");
        assert_eq!(element.id(), "abc-123");
        assert_eq!(element, Element::new(String::from("abc-123")));
    }
}
