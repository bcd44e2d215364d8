//! Tracing subscriber setup
//! Reads LOG_LEVEL / LOG_FORMAT (see [`crate::config::LoggingConfig`]) and
//! installs a global subscriber. RUST_LOG takes precedence when set.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Initialize the global tracing subscriber from environment variables.
pub fn init_tracing() {
    let config = LoggingConfig::from_env().unwrap_or(LoggingConfig {
        level: "INFO".to_string(),
        format: LogFormat::Plain,
    });

    init_tracing_with(&config);
}

/// Initialize the global tracing subscriber from an explicit config.
pub fn init_tracing_with(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_lowercase()));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false);

    // try_init so tests can call this more than once
    match config.format {
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
        LogFormat::Plain => {
            let _ = builder.try_init();
        }
    }
}
