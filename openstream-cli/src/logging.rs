//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Pick the filter: `--verbose` wins, then `RUST_LOG`, then `info`.
pub fn filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install the global subscriber in the configured format.
pub fn init(format: LogFormat, verbose: bool) {
    let builder = tracing_subscriber::fmt().with_env_filter(filter(verbose));
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().flatten_event(true).init(),
    }
}
