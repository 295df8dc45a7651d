//! Tracing subscriber setup.
//!
//! Logs go to stderr so that `econ ask --json` keeps stdout clean. Noisy
//! library targets (HTTP stack, TLS, sqlx) are pinned to `warn` unless
//! `RUST_LOG` is set, in which case it replaces the whole filter.

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Targets that log at `warn` unless `RUST_LOG` says otherwise.
pub const NOISY_MODULES: &[&str] = &[
    "hyper",
    "hyper_util",
    "reqwest",
    "h2",
    "rustls",
    "tokio_util",
    "tower_http",
    "sqlx",
];

fn build_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let mut directives = String::from(level);
    for module in NOISY_MODULES {
        directives.push_str(&format!(",{}=warn", module));
    }
    EnvFilter::new(directives)
}

/// Install the global subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init_logging(level: &str, format: &str) {
    let subscriber = tracing_subscriber::registry().with(build_filter(level));

    if format == "json" {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(true);
        let _ = subscriber.with(layer).try_init();
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(false)
            .with_line_number(false);
        let _ = subscriber.with(layer).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging("debug", "pretty");
        init_logging("info", "json");
        tracing::info!("still logging");
    }
}
