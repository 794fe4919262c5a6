//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding an `EnvFilter` directive, e.g.
/// `PERF360_LOG=perf360::workflow=debug`.
pub const LOG_ENV: &str = "PERF360_LOG";

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "perf360=debug"
    } else {
        "perf360=warn"
    }
}

/// Initialize logging to stderr.
///
/// `PERF360_LOG` wins when set and valid; otherwise `perf360=warn`, or
/// `perf360=debug` with `verbose`. Safe to call more than once.
pub fn init_tracing(verbose: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .init();
    });
}
