use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

// The crate itself plus the HTTP request spans from tower-http
const LOG_TARGETS: [&str; 2] = ["etfview", "tower_http"];

fn app_filter(verbose: bool) -> Targets {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    LOG_TARGETS
        .iter()
        .fold(Targets::new(), |targets, target| {
            targets.with_target(*target, level)
        })
}

/// Installs the global subscriber. `RUST_LOG` narrows what the app filter lets through.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time())
        .with(app_filter(verbose))
        .with(env_filter)
        .try_init()
        .context("Failed to install the log subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_app_filter_levels() {
        let quiet = app_filter(false);
        assert!(quiet.would_enable("etfview::server", &Level::INFO));
        assert!(!quiet.would_enable("etfview::server", &Level::DEBUG));
        assert!(quiet.would_enable("tower_http::trace", &Level::INFO));
        assert!(!quiet.would_enable("hyper", &Level::ERROR));

        let verbose = app_filter(true);
        assert!(verbose.would_enable("etfview::store", &Level::DEBUG));
        assert!(!verbose.would_enable("etfview::store", &Level::TRACE));
    }
}
