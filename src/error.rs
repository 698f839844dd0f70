use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("browser protocol error: {0}")]
    Protocol(#[from] chromiumoxide::error::CdpError),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("element not found: {selector}")]
    NotFound { selector: String },

    #[error("timed out after {waited:?} waiting for {selector}")]
    Timeout { selector: String, waited: Duration },

    #[error("browser session already closed")]
    Closed,
}

/// Why a run stopped before exporting.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not start browser session: {0}")]
    Launch(#[source] SessionError),

    #[error("could not open the site: {0}")]
    Landing(#[source] SessionError),

    #[error("search submission failed: {0}")]
    Search(#[source] SessionError),

    #[error("no listings found for the query")]
    NoListings,

    #[error("pipeline panicked: {0}")]
    Panicked(String),
}
