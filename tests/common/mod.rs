#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use scraper::{Html, Selector};
use wallascrape::SessionError;
use wallascrape::config::Config;
use wallascrape::session::{BrowserSession, Locator};

pub const BASE: &str = "https://www.wallapop.com/";
pub const RESULTS: &str = "https://www.wallapop.com/app/search";

/// Default settings with every sleep and wait collapsed.
pub fn test_config() -> Config {
    Config {
        wait_timeout: Duration::ZERO,
        poll_interval: Duration::ZERO,
        settle: Duration::ZERO,
        landing_pause: Duration::ZERO,
        consent_pause: Duration::ZERO,
        listing_pause: Duration::ZERO,
        courtesy_delay: Duration::ZERO,
        ..Config::default()
    }
}

pub fn landing_page(with_consent: bool, with_search: bool) -> String {
    let consent = if with_consent {
        r#"<div class="cmp"><button id="cmptxt_btn_yes">Aceptar</button></div>"#
    } else {
        ""
    };
    let search = if with_search {
        r#"<input id="searchbox-form-input" type="text">"#
    } else {
        ""
    };
    format!("<html><body>{consent}<header>{search}</header></body></html>")
}

pub fn results_page(ids: &[u32]) -> String {
    let cards: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<a class="item-card_ItemCard__x9" href="/item/{id}">
                     <p class="ItemCard__title">Bici {id}</p>
                     <span class="ItemCard__price">{id}0 €</span>
                   </a>"#
            )
        })
        .collect();
    format!("<html><body><main>{cards}</main></body></html>")
}

pub fn detail_page(id: u32) -> String {
    format!(
        r#"<html><body>
             <h1 class="item-detail_title">Bici {id} completa</h1>
             <div class="item-detail-location_x">Madrid {id}</div>
             <section class="item-detail_description">Descripción {id}</section>
           </body></html>"#
    )
}

pub fn detail_url(id: u32) -> String {
    format!("https://www.wallapop.com/item/{id}")
}

/// What the fake saw, shared with the test after the session is moved
/// into the pipeline.
#[derive(Debug, Default)]
pub struct Journal {
    pub visits: RefCell<Vec<String>>,
    pub typed: RefCell<Vec<String>>,
    pub clicks: RefCell<Vec<String>>,
    pub quits: Cell<usize>,
}

/// In-memory browser: pages are canned HTML keyed by URL, and element
/// lookups run real CSS selectors against the current page.
pub struct FakeSession {
    pages: HashMap<String, String>,
    current: String,
    broken_urls: Vec<String>,
    panic_on_results_source: bool,
    journal: Rc<Journal>,
}

impl FakeSession {
    pub fn new(journal: Rc<Journal>) -> Self {
        Self {
            pages: HashMap::new(),
            current: String::new(),
            broken_urls: Vec::new(),
            panic_on_results_source: false,
            journal,
        }
    }

    pub fn page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    pub fn broken(mut self, url: impl Into<String>) -> Self {
        self.broken_urls.push(url.into());
        self
    }

    pub fn panic_on_results_source(mut self) -> Self {
        self.panic_on_results_source = true;
        self
    }

    fn present(&self, target: &Locator) -> bool {
        let Some(html) = self.pages.get(&self.current) else {
            return false;
        };
        let Ok(selector) = Selector::parse(&target.css_selector()) else {
            return false;
        };
        Html::parse_document(html).select(&selector).next().is_some()
    }

    fn require(&self, target: &Locator) -> Result<(), SessionError> {
        if self.present(target) {
            Ok(())
        } else {
            Err(SessionError::NotFound {
                selector: target.css_selector(),
            })
        }
    }
}

impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.journal.visits.borrow_mut().push(url.to_string());
        if self.broken_urls.iter().any(|u| u == url) {
            return Err(SessionError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_RESET".into(),
            });
        }
        self.current = url.to_string();
        Ok(())
    }

    async fn click(&mut self, target: &Locator) -> Result<(), SessionError> {
        self.require(target)?;
        self.journal.clicks.borrow_mut().push(target.css_selector());
        Ok(())
    }

    async fn clear(&mut self, target: &Locator) -> Result<(), SessionError> {
        self.require(target)
    }

    async fn type_text(&mut self, target: &Locator, text: &str) -> Result<(), SessionError> {
        self.require(target)?;
        self.journal.typed.borrow_mut().push(text.to_string());
        Ok(())
    }

    async fn press_return(&mut self, target: &Locator) -> Result<(), SessionError> {
        self.require(target)?;
        self.current = RESULTS.to_string();
        Ok(())
    }

    async fn wait_for(
        &mut self,
        target: &Locator,
        timeout: Duration,
        _poll: Duration,
    ) -> Result<(), SessionError> {
        if self.present(target) {
            Ok(())
        } else {
            Err(SessionError::Timeout {
                selector: target.css_selector(),
                waited: timeout,
            })
        }
    }

    async fn page_source(&mut self) -> Result<String, SessionError> {
        if self.panic_on_results_source && self.current == RESULTS {
            panic!("renderer crashed while reading results");
        }
        self.pages
            .get(&self.current)
            .cloned()
            .ok_or(SessionError::Closed)
    }

    async fn quit(&mut self) -> Result<(), SessionError> {
        self.journal.quits.set(self.journal.quits.get() + 1);
        Ok(())
    }
}

/// A session where landing, search and every detail page work.
pub fn healthy_session(journal: Rc<Journal>, ids: &[u32]) -> FakeSession {
    let mut session = FakeSession::new(journal)
        .page(BASE, landing_page(true, true))
        .page(RESULTS, results_page(ids));
    for id in ids {
        session = session.page(detail_url(*id), detail_page(*id));
    }
    session
}
