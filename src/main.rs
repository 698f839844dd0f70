use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use wallascrape::config::{Config, DEFAULT_BASE_URL};
use wallascrape::pipeline;
use wallascrape::session::WindowPlacement;

// -------------------------
// CLI
// -------------------------

#[derive(Parser, Debug)]
#[command(name = "wallascrape")]
#[command(about = "Scrape Wallapop search results into a CSV file", long_about = None)]
struct Cli {
    /// Search query (words are joined with spaces). Prompted for when absent.
    query: Vec<String>,

    /// Maximum number of listings to visit (0 = no limit)
    #[arg(long, env = "WALLASCRAPE_MAX_ITEMS")]
    max_items: Option<usize>,

    /// Visit every listing on the results page (overrides --max-items)
    #[arg(long)]
    all: bool,

    /// Run the browser without a window
    #[arg(long, env = "WALLASCRAPE_HEADLESS")]
    headless: bool,

    /// Window placement for a visible browser: max, left or right
    #[arg(long, env = "WALLASCRAPE_WINDOW", default_value = "left")]
    window: WindowPlacement,

    #[arg(long, env = "WALLASCRAPE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Timeout in seconds for waits on page elements
    #[arg(long, env = "WALLASCRAPE_TIMEOUT_SECS", default_value = "15")]
    timeout_secs: u64,

    /// Pause in seconds after searching and after opening each listing
    #[arg(long, env = "WALLASCRAPE_SETTLE_SECS", default_value = "5")]
    settle_secs: u64,

    #[arg(long, env = "WALLASCRAPE_LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,

    #[arg(long, env = "WALLASCRAPE_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,
}

impl Cli {
    fn config(&self) -> Config {
        let mut cfg = Config {
            base_url: self.base_url.clone(),
            wait_timeout: Duration::from_secs(self.timeout_secs),
            settle: Duration::from_secs(self.settle_secs),
            log_dir: self.log_dir.clone(),
            output_dir: self.output_dir.clone(),
            ..Config::default()
        };
        cfg.launch.headless = self.headless;
        cfg.launch.placement = self.window;
        if self.all {
            cfg.max_items = None;
        }
        cfg
    }

    /// Call-time cap; `--all` wins over a value from the flag or the env.
    fn cap(&self) -> Option<usize> {
        if self.all { None } else { self.max_items }
    }
}

fn prompt_query() -> io::Result<String> {
    print!("Search term (e.g. 'MacBook'): ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    eprintln!("Starting wallascrape …");

    let query = if cli.query.is_empty() {
        match prompt_query() {
            Ok(q) => q,
            Err(e) => {
                eprintln!("could not read query: {e}");
                return;
            }
        }
    } else {
        let q = cli.query.join(" ");
        eprintln!("Searching for '{q}'");
        q
    };
    let query = query.trim();
    if query.is_empty() {
        eprintln!("Empty search, nothing to do.");
        return;
    }

    let cfg = cli.config();
    let report = pipeline::run(&cfg, query, cli.cap()).await;
    match (&report.error, &report.export) {
        (None, Some(path)) => eprintln!("Saved {} listings to {}", report.records.len(), path.display()),
        (None, None) => eprintln!("Finished without writing a file; see the log for details."),
        (Some(e), _) => eprintln!("Run failed after {:?}: {e}", report.reached),
    }
}
