//! Logging setup, powered by tracing-subscriber.
//!
//! `RUST_LOG` wins when set; otherwise the level comes from the `-v` count.
//! Events go to stderr so stdout stays machine-readable.

use tracing_subscriber::EnvFilter;

/// Maps the `-v` count to a base level. `quiet` caps it at `error`.
pub fn level_for(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Builds the filter: the base level plus overrides for noisy dependencies.
pub fn build_env_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let directives = [
        level.to_string(),
        "sqlx=warn".to_string(),
        "sqlparser=warn".to_string(),
    ];
    EnvFilter::new(directives.join(","))
}

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init_logging(verbose: u8, quiet: bool) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(verbose > 1)
        .with_env_filter(build_env_filter(level_for(verbose, quiet)))
        .try_init();
}
