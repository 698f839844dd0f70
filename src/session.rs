use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use rand::rng;
use rand::seq::IndexedRandom;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::error::SessionError;

// -------------------------
// Locators / options
// -------------------------

/// How an element is addressed on the live page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Id(String),
    Css(String),
}

impl Locator {
    pub fn css_selector(&self) -> String {
        match self {
            Locator::Id(id) => format!("#{id}"),
            Locator::Css(css) => css.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "id={id}"),
            Locator::Css(css) => write!(f, "css={css}"),
        }
    }
}

/// Where a windowed browser is placed on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPlacement {
    Maximized,
    Left,
    Right,
}

impl FromStr for WindowPlacement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "max" | "maximized" => Ok(Self::Maximized),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(format!("unknown window placement '{other}' (max|left|right)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub headless: bool,
    pub placement: WindowPlacement,
    /// Screen size the half-width placements are computed from.
    pub screen: (u32, u32),
}

impl LaunchOptions {
    /// Window geometry flags for a windowed browser.
    fn window_args(&self) -> Vec<String> {
        let (width, height) = self.screen;
        match self.placement {
            WindowPlacement::Maximized => vec!["--start-maximized".into()],
            WindowPlacement::Left => vec![
                format!("--window-size={},{}", width / 2, height),
                "--window-position=0,0".into(),
            ],
            WindowPlacement::Right => vec![
                format!("--window-size={},{}", width / 2, height),
                format!("--window-position={},0", width / 2),
            ],
        }
    }
}

// -------------------------
// Session seam
// -------------------------

/// The browser operations the pipeline needs. Implemented over CDP by
/// [`ChromeSession`]; tests drive the pipeline with scripted fakes.
#[allow(async_fn_in_trait)]
pub trait BrowserSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    async fn click(&mut self, target: &Locator) -> Result<(), SessionError>;

    async fn clear(&mut self, target: &Locator) -> Result<(), SessionError>;

    async fn type_text(&mut self, target: &Locator, text: &str) -> Result<(), SessionError>;

    async fn press_return(&mut self, target: &Locator) -> Result<(), SessionError>;

    /// Polls until `target` is present or `timeout` elapses.
    async fn wait_for(
        &mut self,
        target: &Locator,
        timeout: Duration,
        poll: Duration,
    ) -> Result<(), SessionError>;

    async fn page_source(&mut self) -> Result<String, SessionError>;

    /// Releases the browser. Calling it again is a no-op.
    async fn quit(&mut self) -> Result<(), SessionError>;
}

// -------------------------
// Chrome over CDP
// -------------------------

pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    closed: bool,
}

impl ChromeSession {
    pub async fn launch(opts: &LaunchOptions) -> Result<Self, SessionError> {
        let mut builder = BrowserConfig::builder()
            .arg("--password-store=basic")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", random_chrome_ua()));
        if !opts.headless {
            builder = builder.with_head().viewport(None);
            for arg in opts.window_args() {
                builder = builder.arg(arg);
            }
        }
        let config = builder.build().map_err(SessionError::Launch)?;

        info!(headless = opts.headless, placement = ?opts.placement, "launching browser");
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("cdp handler event error: {e}");
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        Ok(Self {
            browser,
            page,
            handler,
            closed: false,
        })
    }

    fn live_page(&self) -> Result<&Page, SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        Ok(&self.page)
    }

    async fn element(&self, target: &Locator) -> Result<chromiumoxide::Element, SessionError> {
        let selector = target.css_selector();
        self.live_page()?
            .find_element(selector.as_str())
            .await
            .map_err(|_| SessionError::NotFound { selector })
    }
}

impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        debug!("navigate {url}");
        self.live_page()?
            .goto(url)
            .await
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn click(&mut self, target: &Locator) -> Result<(), SessionError> {
        self.element(target).await?.click().await?;
        Ok(())
    }

    async fn clear(&mut self, target: &Locator) -> Result<(), SessionError> {
        self.element(target)
            .await?
            .call_js_fn("function() { this.value = ''; }", false)
            .await?;
        Ok(())
    }

    async fn type_text(&mut self, target: &Locator, text: &str) -> Result<(), SessionError> {
        self.element(target).await?.type_str(text).await?;
        Ok(())
    }

    async fn press_return(&mut self, target: &Locator) -> Result<(), SessionError> {
        self.element(target).await?.press_key("Enter").await?;
        Ok(())
    }

    async fn wait_for(
        &mut self,
        target: &Locator,
        timeout: Duration,
        poll: Duration,
    ) -> Result<(), SessionError> {
        let selector = target.css_selector();
        let started = Instant::now();
        loop {
            if self
                .live_page()?
                .find_element(selector.as_str())
                .await
                .is_ok()
            {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(SessionError::Timeout {
                    selector,
                    waited: timeout,
                });
            }
            sleep(poll).await;
        }
    }

    async fn page_source(&mut self) -> Result<String, SessionError> {
        Ok(self.live_page()?.content().await?)
    }

    async fn quit(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            warn!("browser process did not exit cleanly: {e}");
        }
        self.handler.abort();
        closed?;
        info!("browser session closed");
        Ok(())
    }
}

// -------------------------
// Misc helpers
// -------------------------

/// Stable Chrome builds in the reduced UA format Chrome itself sends.
const CHROME_UAS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
];

fn random_chrome_ua() -> &'static str {
    CHROME_UAS
        .choose(&mut rng())
        .copied()
        .unwrap_or(CHROME_UAS[0])
}
