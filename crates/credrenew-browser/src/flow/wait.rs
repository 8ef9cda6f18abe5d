//! Bounded waits for page elements.

use std::time::Duration;

use tokio::time::{Instant, sleep};

use crate::error::{Error, Result};
use crate::page::{Element, Page};

/// Polls until an element matching `selector` exists.
///
/// # Errors
///
/// Returns [`Error::Timeout`] once `timeout` elapses without a match, or any
/// transport error raised by the page.
pub async fn wait_for<P: Page + ?Sized>(
    page: &mut P,
    selector: &str,
    timeout: Duration,
    poll: Duration,
) -> Result<Element> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(element) = page.find(selector).await? {
            return Ok(element);
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(Error::Timeout {
                what: format!("element `{selector}`"),
                after: timeout,
            });
        }
        sleep(poll.min(deadline - now)).await;
    }
}

/// Polls for an optional element; absence after `timeout` is `Ok(None)`.
///
/// # Errors
///
/// Returns transport errors raised by the page.
pub async fn probe<P: Page + ?Sized>(
    page: &mut P,
    selector: &str,
    timeout: Duration,
    poll: Duration,
) -> Result<Option<Element>> {
    match wait_for(page, selector, timeout, poll).await {
        Ok(element) => Ok(Some(element)),
        Err(e) if e.is_timeout() => Ok(None),
        Err(e) => Err(e),
    }
}
