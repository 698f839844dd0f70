use scraper::{ElementRef, Html};
use tokio::time::sleep;
use tracing::{error, info, warn};
use url::{ParseError, Url};

use crate::config::{CardPatterns, Config};
use crate::html::{ClassRule, Matcher, collapsed_text, find_all, find_by_class_pattern};
use crate::record::{Field, Record};
use crate::session::{BrowserSession, Locator};

/// Absolute form of a card link. Absolute hrefs come back untouched;
/// relative ones are resolved against the site origin.
pub fn normalize_url(href: &str, base: &Url) -> Result<String, ParseError> {
    match Url::parse(href) {
        Ok(_) => Ok(href.to_string()),
        Err(ParseError::RelativeUrlWithoutBase) => base.join(href).map(String::from),
        Err(e) => Err(e),
    }
}

/// One item card. `Ok(None)` for a card without a link.
pub fn parse_card(
    card: ElementRef<'_>,
    base: &Url,
    patterns: &CardPatterns,
) -> Result<Option<Record>, ParseError> {
    let Some(href) = card.value().attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
        return Ok(None);
    };
    let url = normalize_url(href, base)?;

    let text_of = |pats: &[String]| find_by_class_pattern(card, pats).and_then(collapsed_text);
    let title = Field::from_text(text_of(&patterns.title), Field::Unavailable);
    let price = Field::from_text(text_of(&patterns.price), Field::Unavailable);
    // the detail page gets another go at anything missing here
    let location = Field::from_text(text_of(&patterns.location), Field::Pending);

    Ok(Some(Record::from_card(url, title, price, location)))
}

/// All records on a rendered results page, in card order.
pub fn parse_listing(html: &str, cfg: &Config) -> Vec<Record> {
    let base = match Url::parse(&cfg.base_url) {
        Ok(u) => u,
        Err(e) => {
            error!("invalid base url {}: {e}", cfg.base_url);
            return Vec::new();
        }
    };
    let selectors = &cfg.selectors;
    let tags = [selectors.item_card_tag.as_str()];
    let card_matcher =
        Matcher::tags(&tags).with_class(ClassRule::Contains(&selectors.item_card_class));

    let doc = Html::parse_document(html);
    let cards: Vec<ElementRef<'_>> = find_all(doc.root_element(), &card_matcher).collect();
    info!("found {} item cards on results page", cards.len());

    let mut records = Vec::with_capacity(cards.len());
    for (idx, card) in cards.into_iter().enumerate() {
        match parse_card(card, &base, &selectors.card) {
            Ok(Some(rec)) => records.push(rec),
            Ok(None) => {}
            Err(e) => warn!("card {}: unusable link: {e}", idx + 1),
        }
    }
    records
}

/// Waits for item cards to render, then parses the results page. Every
/// failure here yields an empty list; the caller decides what that means.
pub async fn collect_listing<S: BrowserSession>(session: &mut S, cfg: &Config) -> Vec<Record> {
    info!("extracting results listing");
    let cards = Locator::Css(cfg.selectors.item_card_css());
    if let Err(e) = session
        .wait_for(&cards, cfg.wait_timeout, cfg.poll_interval)
        .await
    {
        error!("item cards never appeared: {e}");
        return Vec::new();
    }
    sleep(cfg.listing_pause).await;

    match session.page_source().await {
        Ok(html) => parse_listing(&html, cfg),
        Err(e) => {
            error!("could not read results page: {e}");
            Vec::new()
        }
    }
}
