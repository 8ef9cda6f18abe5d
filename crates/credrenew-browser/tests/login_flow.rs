//! Login state machine tests against a scripted page.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use credrenew_browser::{
    Element, Error, Launcher, LoginFlow, LoginStep, LoginSurface, Page, Result,
};

const SEED: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

/// One screen of the scripted login surface.
#[derive(Clone)]
struct Screen {
    url: &'static str,
    controls: Vec<String>,
    error: Option<&'static str>,
}

impl Screen {
    fn new(url: &'static str, controls: &[&str]) -> Self {
        Self {
            url,
            controls: controls.iter().map(ToString::to_string).collect(),
            error: None,
        }
    }
}

/// Shared record of what the flow did.
#[derive(Default)]
struct Journal {
    typed: HashMap<String, String>,
    clicked: Vec<String>,
    closed: usize,
    navigated: Vec<String>,
}

/// Page that advances to the next screen on every submit or click.
struct ScriptedPage {
    screens: Vec<Screen>,
    index: usize,
    journal: Arc<Mutex<Journal>>,
}

impl ScriptedPage {
    fn screen(&self) -> &Screen {
        &self.screens[self.index]
    }

    fn advance(&mut self) {
        if self.index + 1 < self.screens.len() {
            self.index += 1;
        }
    }
}

#[async_trait]
impl Page for ScriptedPage {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.index = 0;
        self.journal.lock().unwrap().navigated.push(url.to_string());
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.screen().url.to_string())
    }

    async fn find(&mut self, selector: &str) -> Result<Option<Element>> {
        let screen = self.screen();
        let surface = LoginSurface::default();
        if selector == surface.error_selector {
            return Ok(screen.error.map(|_| Element::new("error")));
        }
        Ok(screen
            .controls
            .iter()
            .find(|c| c.as_str() == selector)
            .map(|c| Element::new(c.clone())))
    }

    async fn send_keys(&mut self, element: &Element, text: &str) -> Result<()> {
        self.journal
            .lock()
            .unwrap()
            .typed
            .entry(element.id().to_string())
            .or_default()
            .push_str(text);
        Ok(())
    }

    async fn submit(&mut self, _element: &Element) -> Result<()> {
        self.advance();
        Ok(())
    }

    async fn click(&mut self, element: &Element) -> Result<()> {
        self.journal
            .lock()
            .unwrap()
            .clicked
            .push(element.id().to_string());
        self.advance();
        Ok(())
    }

    async fn text(&mut self, _element: &Element) -> Result<String> {
        Ok(self.screen().error.unwrap_or_default().to_string())
    }

    async fn close(&mut self) -> Result<()> {
        self.journal.lock().unwrap().closed += 1;
        Ok(())
    }
}

struct ScriptedLauncher {
    screens: Vec<Screen>,
    journal: Arc<Mutex<Journal>>,
    fail_launch: bool,
}

#[async_trait]
impl Launcher for ScriptedLauncher {
    type Page = ScriptedPage;

    async fn launch(&self) -> Result<ScriptedPage> {
        if self.fail_launch {
            return Err(Error::webdriver("session not created", "no browser"));
        }
        Ok(ScriptedPage {
            screens: self.screens.clone(),
            index: 0,
            journal: Arc::clone(&self.journal),
        })
    }
}

fn flow(screens: Vec<Screen>) -> (LoginFlow<ScriptedLauncher>, Arc<Mutex<Journal>>) {
    let journal = Arc::new(Mutex::new(Journal::default()));
    let launcher = ScriptedLauncher {
        screens,
        journal: Arc::clone(&journal),
        fail_launch: false,
    };
    (LoginFlow::new(launcher, LoginSurface::default()), journal)
}

fn credential_screens() -> Vec<Screen> {
    let s = LoginSurface::default();
    vec![
        Screen::new("https://login.live.com/login.srf", &[&s.identifier_selector]),
        Screen::new("https://login.live.com/login.srf", &[&s.secret_selector]),
        Screen::new("https://login.live.com/ppsecure", &[&s.otp_selector]),
    ]
}

fn terms_screen() -> Screen {
    let s = LoginSurface::default();
    Screen::new(
        "https://account.live.com/tou/accrue?mkt=en-US",
        &[&s.terms_accept_selector],
    )
}

fn stay_signed_in_screen() -> Screen {
    let s = LoginSurface::default();
    Screen::new(
        "https://login.live.com/ppsecure/post.srf",
        &[&s.terms_accept_selector, &s.stay_signed_in_decline_selector],
    )
}

fn landing() -> Screen {
    Screen::new("https://www.microsoft.com/en-us/store/", &[])
}

#[tokio::test(start_paused = true)]
async fn test_full_login_with_both_interstitials() {
    let mut screens = credential_screens();
    screens.extend([terms_screen(), stay_signed_in_screen(), landing()]);
    let (flow, journal) = flow(screens);

    let outcome = flow
        .attempt_login("user@example.com", "hunter2", SEED)
        .await;

    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(outcome.terminal, LoginStep::Success);
    assert_eq!(
        outcome.trail,
        vec![
            LoginStep::Navigate,
            LoginStep::EnterIdentifier,
            LoginStep::EnterSecret,
            LoginStep::EnterOneTimeCode,
            LoginStep::TermsScreen,
            LoginStep::StaySignedInScreen,
            LoginStep::Verify,
        ]
    );

    let s = LoginSurface::default();
    let journal = journal.lock().unwrap();
    assert_eq!(journal.navigated, vec![s.login_url.clone()]);
    assert_eq!(journal.typed[&s.identifier_selector], "user@example.com");
    assert_eq!(journal.typed[&s.secret_selector], "hunter2");
    let code = &journal.typed[&s.otp_selector];
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(
        journal.clicked,
        vec![
            s.terms_accept_selector.clone(),
            s.stay_signed_in_decline_selector.clone()
        ]
    );
    assert_eq!(journal.closed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_terms_screen_is_skipped() {
    let mut screens = credential_screens();
    screens.extend([stay_signed_in_screen(), landing()]);
    let (flow, journal) = flow(screens);

    let outcome = flow
        .attempt_login("user@example.com", "hunter2", SEED)
        .await;

    assert!(outcome.success, "{}", outcome.message);
    assert!(!outcome.visited(LoginStep::TermsScreen));
    assert!(outcome.visited(LoginStep::StaySignedInScreen));
    assert_eq!(outcome.last_step(), Some(LoginStep::Verify));

    // The accept button shares its selector with "yes, stay signed in";
    // it must not be clicked outside the terms screen.
    let s = LoginSurface::default();
    assert_eq!(
        journal.lock().unwrap().clicked,
        vec![s.stay_signed_in_decline_selector]
    );
}

#[tokio::test(start_paused = true)]
async fn test_no_interstitials_reaches_verify() {
    let mut screens = credential_screens();
    screens.push(landing());
    let (flow, journal) = flow(screens);

    let outcome = flow
        .attempt_login("user@example.com", "hunter2", SEED)
        .await;

    assert!(outcome.success, "{}", outcome.message);
    assert!(outcome.visited(LoginStep::Verify));
    assert!(journal.lock().unwrap().clicked.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_secret_field_times_out() {
    let s = LoginSurface::default();
    let screens = vec![
        Screen::new("https://login.live.com/login.srf", &[&s.identifier_selector]),
        Screen::new("https://login.live.com/login.srf", &[]),
    ];
    let (flow, journal) = flow(screens);

    let outcome = flow
        .attempt_login("user@example.com", "hunter2", SEED)
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.terminal, LoginStep::Failure);
    assert_eq!(outcome.last_step(), Some(LoginStep::EnterSecret));
    assert!(outcome.message.starts_with("ENTER_SECRET failed"));
    assert!(outcome.message.contains("Timed out"));
    assert!(!outcome.message.contains("hunter2"));
    assert!(!outcome.visited(LoginStep::Verify));
    assert_eq!(journal.lock().unwrap().closed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_error_indicator_fails_verify() {
    let mut screens = credential_screens();
    let mut failed = landing();
    failed.error = Some("That code didn't work.");
    screens.push(failed);
    let (flow, journal) = flow(screens);

    let outcome = flow
        .attempt_login("user@example.com", "hunter2", SEED)
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.last_step(), Some(LoginStep::Verify));
    assert_eq!(outcome.message, "Login failed: That code didn't work.");
    assert_eq!(journal.lock().unwrap().closed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_wrong_destination_fails_verify() {
    let mut screens = credential_screens();
    screens.push(Screen::new("https://account.live.com/recover", &[]));
    let (flow, _journal) = flow(screens);

    let outcome = flow
        .attempt_login("user@example.com", "hunter2", SEED)
        .await;

    assert!(!outcome.success);
    assert!(outcome.message.contains("unexpected destination"));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_seed_fails_before_typing_code() {
    let mut screens = credential_screens();
    screens.push(landing());
    let (flow, journal) = flow(screens);

    let outcome = flow
        .attempt_login("user@example.com", "hunter2", "!!not-base32!!")
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.last_step(), Some(LoginStep::EnterOneTimeCode));
    let journal = journal.lock().unwrap();
    assert!(!journal.typed.contains_key(&LoginSurface::default().otp_selector));
    assert_eq!(journal.closed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_launch_failure_is_reported() {
    let journal = Arc::new(Mutex::new(Journal::default()));
    let launcher = ScriptedLauncher {
        screens: Vec::new(),
        journal: Arc::clone(&journal),
        fail_launch: true,
    };
    let flow = LoginFlow::new(launcher, LoginSurface::default());

    let outcome = flow
        .attempt_login("user@example.com", "hunter2", SEED)
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.trail, vec![LoginStep::Navigate]);
    assert!(outcome.message.starts_with("NAVIGATE failed"));
    assert_eq!(journal.lock().unwrap().closed, 0);
}
