//! # credrenew-browser
//!
//! Drives a single remote login surface through a browser session.
//!
//! ## Features
//!
//! - **Login state machine**: navigate, identifier, secret, one-time code,
//!   optional interstitial screens, verification
//! - **Bounded waits**: required controls time out into a failure, optional
//!   screens are probed and skipped when absent
//! - **WebDriver transport**: W3C WebDriver over HTTP (chromedriver,
//!   geckodriver, Selenium)
//! - **TOTP**: RFC 6238 codes generated right before submission
//!
//! ## Quick Start
//!
//! ```ignore
//! use credrenew_browser::{LoginFlow, LoginSurface, WebDriver, WebDriverConfig};
//!
//! let flow = LoginFlow::new(WebDriver::new(WebDriverConfig::default())?, LoginSurface::default());
//! let outcome = flow.attempt_login("user@example.com", "password", "JBSWY3DPEHPK3PXP").await;
//! println!("{}: {}", outcome.success, outcome.message);
//! ```
//!
//! ## Login States
//!
//! ```text
//! NAVIGATE → ENTER_IDENTIFIER → ENTER_SECRET → ENTER_ONE_TIME_CODE
//!   → [TERMS_SCREEN] → [STAY_SIGNED_IN_SCREEN] → VERIFY → SUCCESS | FAILURE
//! ```
//!
//! Bracketed screens may or may not appear. Any error along the way ends the
//! attempt in FAILURE; the browser session is released on every path.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod flow;
pub mod page;
pub mod totp;
pub mod webdriver;

pub use error::{Error, Result};
pub use flow::{Authenticator, LoginFlow, LoginOutcome, LoginStep, LoginSurface};
pub use page::{Element, Launcher, Page};
pub use webdriver::{WebDriver, WebDriverConfig, WebDriverSession};
