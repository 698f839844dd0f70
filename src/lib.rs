//! Browser-driven scraper for Wallapop search results: opens the site,
//! accepts cookies, searches, reads the result cards, visits each listing
//! to fill in what the cards lack, and writes everything to a CSV file.

pub mod config;
pub mod detail;
pub mod error;
pub mod export;
pub mod html;
pub mod listing;
pub mod logging;
pub mod paths;
pub mod pipeline;
pub mod record;
pub mod session;

pub use config::Config;
pub use error::{RunError, SessionError};
pub use pipeline::{RunReport, Stage};
pub use record::{Field, Record};
