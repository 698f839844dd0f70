use std::path::PathBuf;

use time::OffsetDateTime;
use time::macros::format_description;

use crate::config::Config;

/// File-name-safe form of a search query.
pub fn sanitize_query(query: &str) -> String {
    query
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

pub(crate) fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// `YYYYMMDD_HHMMSS`, shared by every file a run produces.
pub fn run_timestamp() -> String {
    now()
        .format(format_description!("[year][month][day]_[hour][minute][second]"))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub log_file: PathBuf,
    pub export_file: PathBuf,
}

impl RunPaths {
    pub fn new(cfg: &Config, query: &str, timestamp: &str) -> Self {
        let stem = sanitize_query(query);
        Self {
            log_file: cfg.log_dir.join(format!("{stem}_{timestamp}.log")),
            export_file: cfg.output_dir.join(format!("{stem}_detalles_{timestamp}.csv")),
        }
    }
}
