use std::path::PathBuf;
use std::time::Duration;

use crate::session::{LaunchOptions, WindowPlacement};

pub const DEFAULT_BASE_URL: &str = "https://www.wallapop.com/";
pub const DEFAULT_MAX_ITEMS: usize = 3;

// -------------------------
// Selector table
// -------------------------

/// Class substrings tried against one item card, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardPatterns {
    pub title: Vec<String>,
    pub price: Vec<String>,
    pub location: Vec<String>,
}

/// Class substrings tried against a whole detail page, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPatterns {
    pub title: Vec<String>,
    pub price: Vec<String>,
    pub description: Vec<String>,
    pub location: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    /// CSS selectors for the consent button; first click that works wins.
    pub consent: Vec<String>,
    /// Element id of the search input.
    pub search_box_id: String,
    pub item_card_tag: String,
    pub item_card_class: String,
    pub card: CardPatterns,
    pub detail: DetailPatterns,
}

impl Selectors {
    /// CSS form of the item-card pattern, used for the bounded wait.
    pub fn item_card_css(&self) -> String {
        format!("{}[class*='{}']", self.item_card_tag, self.item_card_class)
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            consent: owned(&[
                "#cmptxt_btn_yes",
                "#onetrust-accept-btn-handler",
                "[id*='accept']",
                "button[class*='accept']",
                "[class*='btn_yes']",
            ]),
            search_box_id: "searchbox-form-input".into(),
            item_card_tag: "a".into(),
            item_card_class: "item-card_ItemCard".into(),
            card: CardPatterns {
                title: owned(&["ItemCard__title"]),
                price: owned(&["ItemCard__price"]),
                location: owned(&["location", "distance"]),
            },
            detail: DetailPatterns {
                title: owned(&["h1", "h2", "title"]),
                price: owned(&["item-detail-price", "price"]),
                description: owned(&["description", "item-detail-description"]),
                location: owned(&["item-detail-location", "location"]),
            },
        }
    }
}

// -------------------------
// Run configuration
// -------------------------

/// Process-wide settings. Built once at startup and only read afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    /// Upper bound for polling waits on markup.
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
    /// Fixed sleep after search submission and detail navigation.
    pub settle: Duration,
    /// Fixed sleep after opening the site root.
    pub landing_pause: Duration,
    pub consent_pause: Duration,
    /// Extra render time once item cards are present.
    pub listing_pause: Duration,
    /// Pause between consecutive detail visits.
    pub courtesy_delay: Duration,
    pub max_items: Option<usize>,
    pub log_dir: PathBuf,
    pub output_dir: PathBuf,
    pub launch: LaunchOptions,
    pub selectors: Selectors,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            wait_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_millis(250),
            settle: Duration::from_secs(5),
            landing_pause: Duration::from_secs(2),
            consent_pause: Duration::from_secs(1),
            listing_pause: Duration::from_secs(2),
            courtesy_delay: Duration::from_secs(2),
            max_items: Some(DEFAULT_MAX_ITEMS),
            log_dir: PathBuf::from("logs"),
            output_dir: PathBuf::from("output"),
            launch: LaunchOptions {
                headless: false,
                placement: WindowPlacement::Left,
                screen: (1920, 1080),
            },
            selectors: Selectors::default(),
        }
    }
}

impl Config {
    /// Cap applied to a run: an explicit argument wins over the configured
    /// default. Zero means no cap.
    pub fn effective_cap(&self, requested: Option<usize>) -> Option<usize> {
        requested.or(self.max_items).filter(|n| *n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_card_css_uses_substring_attribute_match() {
        assert_eq!(
            Selectors::default().item_card_css(),
            "a[class*='item-card_ItemCard']"
        );
    }

    #[test]
    fn cap_resolution() {
        let cfg = Config::default();
        assert_eq!(cfg.effective_cap(None), Some(3));
        assert_eq!(cfg.effective_cap(Some(10)), Some(10));
        assert_eq!(cfg.effective_cap(Some(0)), None);

        let uncapped = Config {
            max_items: None,
            ..Config::default()
        };
        assert_eq!(uncapped.effective_cap(None), None);
    }
}
