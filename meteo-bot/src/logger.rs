//! Logging initialization: human-readable lines (timestamp, level, target, message, fields)
//! to stdout and, optionally, a log file.

use std::{fs::OpenOptions, io, path::Path, sync::Arc};

use anyhow::Context;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{format::Writer, time::FormatTime, writer::MakeWriterExt},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Local time in `YYYY-MM-DD HH:MM:SS`.
struct ChronoLocal;

impl FormatTime for ChronoLocal {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{} ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Installs the global tracing subscriber.
///
/// Level comes from `RUST_LOG` (default `info`). When `log_file` is given,
/// output is teed to it in append mode, without ANSI codes.
pub fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let event_format = tracing_subscriber::fmt::format()
        .with_timer(ChronoLocal)
        .with_level(true)
        .with_target(true);

    let registry = Registry::default().with(env_filter);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory: {}", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;

            let layer = tracing_subscriber::fmt::layer()
                .with_writer(io::stdout.and(Arc::new(file)))
                .event_format(event_format)
                .with_ansi(false);
            registry.with(layer).try_init()
        }
        None => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(io::stdout)
                .event_format(event_format);
            registry.with(layer).try_init()
        }
    }
    .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {e}"))
}
