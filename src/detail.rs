use scraper::Html;
use tokio::time::sleep;
use tracing::{error, info};

use crate::config::{Config, DetailPatterns};
use crate::error::SessionError;
use crate::html::{ClassRule, Matcher, collapsed_text, find_first, find_in_document};
use crate::record::{Field, Record};
use crate::session::BrowserSession;

const HEADING: &[&str] = &["h1"];
const DESCRIPTION_BLOCKS: &[&str] = &["div", "section"];

/// Fills every unresolved field of `record` from a parsed detail page.
/// `Unavailable` fields from the listing are attempted again.
pub fn backfill(record: &mut Record, doc: &Html, patterns: &DetailPatterns) {
    let root = doc.root_element();

    if !record.title.is_resolved() {
        let node = find_in_document(doc, &patterns.title)
            .or_else(|| find_first(root, &Matcher::tags(HEADING)));
        record.title = Field::from_text(node.and_then(collapsed_text), Field::Unavailable);
    }

    if !record.price.is_resolved() {
        let node = find_in_document(doc, &patterns.price);
        record.price = Field::from_text(node.and_then(collapsed_text), Field::Unavailable);
    }

    if !record.location.is_resolved() {
        let node = find_in_document(doc, &patterns.location);
        record.location = Field::from_text(node.and_then(collapsed_text), Field::Unavailable);
    }

    if !record.description.is_resolved() {
        let block = Matcher::tags(DESCRIPTION_BLOCKS)
            .with_class(ClassRule::ContainsIgnoreCase("description"));
        let node = find_in_document(doc, &patterns.description)
            .or_else(|| find_first(root, &block));
        record.description = Field::from_text(node.and_then(collapsed_text), Field::Unavailable);
    }
}

async fn load_detail<S: BrowserSession>(
    session: &mut S,
    url: &str,
    cfg: &Config,
) -> Result<String, SessionError> {
    session.navigate(url).await?;
    sleep(cfg.settle).await;
    session.page_source().await
}

/// Visits the record's page and backfills it. Never fails: on any error the
/// record keeps what it had, and nothing leaves here still `Pending`.
pub async fn scrape_detail<S: BrowserSession>(
    session: &mut S,
    mut record: Record,
    cfg: &Config,
) -> Record {
    match load_detail(session, &record.url, cfg).await {
        Ok(html) => {
            let doc = Html::parse_document(&html);
            backfill(&mut record, &doc, &cfg.selectors.detail);
            info!("[scraped] {} | {}", record.label(), record.price);
        }
        Err(e) => error!("detail page {} failed: {e}", record.url),
    }
    record.settle();
    record
}
