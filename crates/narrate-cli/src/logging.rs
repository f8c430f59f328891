use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber. Falls back to `info` when the
/// configured filter does not parse.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
