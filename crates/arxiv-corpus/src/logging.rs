//! `tracing-subscriber` setup for the binary and the Python module.

use tracing_subscriber::EnvFilter;

use crate::config::LOG_ENV;

/// Install a formatting subscriber filtered by `ARXIV_LOG`, or by
/// `default_filter` when the variable is unset or invalid.
///
/// Safe to call more than once; only the first call installs a subscriber.
/// Returns `true` if this call installed it.
pub fn init_logging(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

/// Map a `-v` count onto a filter directive.
pub fn verbosity_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        let _ = init_logging("warn");
        assert!(!init_logging("warn"));
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(verbosity_filter(0), "info");
        assert_eq!(verbosity_filter(1), "debug");
        assert_eq!(verbosity_filter(7), "trace");
    }
}
