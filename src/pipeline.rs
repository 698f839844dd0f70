use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};

use futures::FutureExt;
use tokio::time::sleep;
use tracing::instrument::WithSubscriber;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::detail::scrape_detail;
use crate::error::{RunError, SessionError};
use crate::export::save_csv;
use crate::listing::collect_listing;
use crate::logging::RunLog;
use crate::paths::{RunPaths, run_timestamp};
use crate::record::Record;
use crate::session::{BrowserSession, ChromeSession, Locator};

/// Pipeline states, in the order a successful run passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    ConsentHandled,
    Searched,
    Listed,
    Capped,
    Detailed,
    Exported,
    /// Terminal state after teardown. Every run ends here, so
    /// [`RunReport::reached`] records the stage before it instead.
    Closed,
}

/// What a run got to. Informational only; the binary never maps it to an
/// exit status.
#[derive(Debug)]
pub struct RunReport {
    /// Last stage completed before teardown (`Closed` always follows).
    pub reached: Stage,
    pub error: Option<RunError>,
    pub records: Vec<Record>,
    pub export: Option<PathBuf>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    fn launch_failed(e: SessionError) -> Self {
        Self {
            reached: Stage::Init,
            error: Some(RunError::Launch(e)),
            records: Vec::new(),
            export: None,
        }
    }
}

#[derive(Debug)]
struct Progress {
    reached: Stage,
    records: Vec<Record>,
    export: Option<PathBuf>,
}

// -------------------------
// Entry points
// -------------------------

/// One complete run with its own log file: launches Chrome, scrapes,
/// exports, tears down.
pub async fn run(cfg: &Config, query: &str, max_items: Option<usize>) -> RunReport {
    let paths = RunPaths::new(cfg, query, &run_timestamp());
    let log = RunLog::start(&paths.log_file);
    run_query(cfg, query, max_items, &paths)
        .with_subscriber(log.dispatch())
        .await
}

pub async fn run_query(
    cfg: &Config,
    query: &str,
    max_items: Option<usize>,
    paths: &RunPaths,
) -> RunReport {
    info!("{}", "=".repeat(50));
    info!("WALLAPOP SCRAPER: {query}");
    info!("{}", "=".repeat(50));

    info!("starting browser session");
    let session = match ChromeSession::launch(&cfg.launch).await {
        Ok(s) => s,
        Err(e) => {
            error!("could not start browser: {e}");
            return RunReport::launch_failed(e);
        }
    };
    run_session(session, cfg, query, max_items, &paths.export_file).await
}

/// Drives an already acquired session through every stage. The session is
/// released exactly once on every path out, including a panic in a stage.
pub async fn run_session<S: BrowserSession>(
    mut session: S,
    cfg: &Config,
    query: &str,
    max_items: Option<usize>,
    export_file: &Path,
) -> RunReport {
    let mut progress = Progress {
        reached: Stage::Init,
        records: Vec::new(),
        export: None,
    };

    let outcome = AssertUnwindSafe(drive(
        &mut session,
        cfg,
        query,
        max_items,
        export_file,
        &mut progress,
    ))
    .catch_unwind()
    .await;

    let error = match outcome {
        Ok(Ok(())) => {
            info!("run finished successfully");
            None
        }
        Ok(Err(e)) => {
            error!("run aborted after {:?}: {e}", progress.reached);
            Some(e)
        }
        Err(panic) => {
            let msg = panic_message(panic.as_ref());
            error!("fatal error during run (after {:?}): {msg}", progress.reached);
            Some(RunError::Panicked(msg))
        }
    };

    if let Err(e) = session.quit().await {
        warn!("browser teardown failed: {e}");
    }

    RunReport {
        reached: progress.reached,
        error,
        records: progress.records,
        export: progress.export,
    }
}

async fn drive<S: BrowserSession>(
    session: &mut S,
    cfg: &Config,
    query: &str,
    max_items: Option<usize>,
    export_file: &Path,
    progress: &mut Progress,
) -> Result<(), RunError> {
    session
        .navigate(&cfg.base_url)
        .await
        .map_err(RunError::Landing)?;
    sleep(cfg.landing_pause).await;

    accept_consent(session, cfg).await;
    progress.reached = Stage::ConsentHandled;

    search(session, cfg, query).await.map_err(RunError::Search)?;
    progress.reached = Stage::Searched;

    let records = collect_listing(session, cfg).await;
    if records.is_empty() {
        return Err(RunError::NoListings);
    }
    progress.reached = Stage::Listed;

    let records = cap(records, cfg.effective_cap(max_items));
    progress.reached = Stage::Capped;

    info!("fetching details for {} items", records.len());
    let total = records.len();
    for (i, rec) in records.into_iter().enumerate() {
        let rec = scrape_detail(session, rec, cfg).await;
        progress.records.push(rec);
        if i + 1 < total {
            sleep(cfg.courtesy_delay).await;
        }
    }
    progress.reached = Stage::Detailed;
    log_summary(&progress.records);

    if save_csv(&progress.records, export_file) {
        progress.export = Some(export_file.to_path_buf());
    }
    progress.reached = Stage::Exported;
    Ok(())
}

// -------------------------
// Stages
// -------------------------

/// Clicks the first consent button that works. A missing dialog is normal.
pub async fn accept_consent<S: BrowserSession>(session: &mut S, cfg: &Config) -> bool {
    info!("accepting cookies");
    let any_button = Locator::Css(cfg.selectors.consent.join(", "));
    if let Err(e) = session
        .wait_for(&any_button, cfg.wait_timeout, cfg.poll_interval)
        .await
    {
        warn!("[!] no cookie dialog found: {e}");
        return false;
    }

    for selector in &cfg.selectors.consent {
        if session.click(&Locator::Css(selector.clone())).await.is_ok() {
            info!("[ok] cookies accepted via {selector}");
            sleep(cfg.consent_pause).await;
            return true;
        }
    }
    warn!("[!] cookie dialog present but no button accepted the click");
    false
}

/// Types the query into the search box and submits it.
pub async fn search<S: BrowserSession>(
    session: &mut S,
    cfg: &Config,
    query: &str,
) -> Result<(), SessionError> {
    info!("searching: {query}");
    let search_box = Locator::Id(cfg.selectors.search_box_id.clone());
    session
        .wait_for(&search_box, cfg.wait_timeout, cfg.poll_interval)
        .await?;
    session.clear(&search_box).await?;
    session.type_text(&search_box, query).await?;
    session.press_return(&search_box).await?;
    sleep(cfg.settle).await;
    Ok(())
}

/// Keeps the first `limit` records; `None` keeps them all.
pub fn cap(mut records: Vec<Record>, limit: Option<usize>) -> Vec<Record> {
    if let Some(n) = limit {
        if records.len() > n {
            info!("capping {} listings to {n}", records.len());
            records.truncate(n);
        }
    }
    records
}

fn log_summary(records: &[Record]) {
    let resolved = |pick: fn(&Record) -> bool| records.iter().filter(|r| pick(r)).count();
    info!(
        "resolved over {} records: title={} price={} location={} description={}",
        records.len(),
        resolved(|r| r.title.is_resolved()),
        resolved(|r| r.price.is_resolved()),
        resolved(|r| r.location.is_resolved()),
        resolved(|r| r.description.is_resolved()),
    );
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
