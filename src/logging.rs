use std::fs;
use std::path::{Path, PathBuf};

use time::macros::format_description;
use tracing::{Dispatch, Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::paths;

/// `<timestamp> - <LEVEL> - <message>` lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let stamp = paths::now()
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second],[subsecond digits:3]"
            ))
            .unwrap_or_default();
        write!(writer, "{stamp} - {} - ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Logger owned by one run: console plus a per-run file. Nothing is
/// installed globally; the run future is wrapped with [`RunLog::dispatch`].
pub struct RunLog {
    dispatch: Dispatch,
    file: Option<PathBuf>,
    _guard: Option<WorkerGuard>,
}

fn file_writer(path: &Path) -> std::io::Result<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "run.log".into());
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
        .map_err(std::io::Error::other)
}

impl RunLog {
    pub fn start(log_file: &Path) -> Self {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,chromiumoxide=warn"));
        let console = fmt::layer()
            .event_format(LineFormat)
            .with_writer(std::io::stdout);

        let (file_layer, guard, file, failure) = match file_writer(log_file) {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .event_format(LineFormat)
                    .with_ansi(false)
                    .with_writer(writer);
                (Some(layer), Some(guard), Some(log_file.to_path_buf()), None)
            }
            Err(e) => (None, None, None, Some(e)),
        };

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .with(file_layer);
        let dispatch = Dispatch::new(subscriber);

        if let Some(e) = failure {
            tracing::dispatcher::with_default(&dispatch, || {
                tracing::warn!("log file {} unavailable, console only: {e}", log_file.display());
            });
        }

        Self {
            dispatch,
            file,
            _guard: guard,
        }
    }

    pub fn dispatch(&self) -> Dispatch {
        self.dispatch.clone()
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}
