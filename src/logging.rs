use std::path::Path;
use thiserror::Error;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,tera=warn,reqwest=warn,hyper_util=warn";

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to open log directory: {0}")]
    Appender(#[from] InitError),
    #[error("Failed to install log subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Daily-rotated `statusboard.*.log` files under `log_dir`.
pub fn file_appender(log_dir: impl AsRef<Path>) -> Result<RollingFileAppender, LoggingError> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("statusboard")
        .filename_suffix("log")
        .build(log_dir)?;
    Ok(appender)
}

pub fn init_logging(log_dir: &str) -> Result<(), LoggingError> {
    // Log to a file: JSON format, daily rotation
    let file_layer = fmt::layer()
        .with_writer(file_appender(log_dir)?)
        .with_ansi(false)
        .json();

    // Human-readable on stderr; `render` may be writing the page to stdout.
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;
    Ok(())
}
