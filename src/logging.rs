use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::LogFormat;

/// Installs the global subscriber. Logs go to stderr unless `file` is set,
/// so stdout stays clean for the decomposition output.
pub fn init_logging(level: &str, format: LogFormat, file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    match (file, format) {
        (Some(path), LogFormat::Text) => {
            let writer = Arc::new(open_log_file(path)?);
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_file(true)
                        .with_line_number(true)
                        .with_writer(writer),
                )
                .try_init()?;
        }
        (Some(path), LogFormat::Json) => {
            let writer = Arc::new(open_log_file(path)?);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(writer))
                .try_init()?;
        }
        (None, LogFormat::Text) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
        }
        (None, LogFormat::Json) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()?;
        }
    }

    info!("logging initialized");
    Ok(())
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    std::fs::File::create(path).with_context(|| format!("create log file: {}", path.display()))
}
