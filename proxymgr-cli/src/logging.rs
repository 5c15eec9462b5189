//! Diagnostic logging to stderr.

use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "proxymgr=info";
const VERBOSE_FILTER: &str = "proxymgr=debug";

/// Install the global subscriber. `RUST_LOG` applies unless `verbose` is set.
pub fn init(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    if json {
        let _ = fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
