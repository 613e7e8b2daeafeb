//! Setup and initialization functions for CLI
//!
//! Thread pool configuration and logging setup.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an explicit tracing filter
pub const LOG_ENV: &str = "CPPSIG_LOG";

/// Rayon thread stack size (8MB for deeply nested syntax trees)
const RAYON_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Configure rayon global thread pool once at startup
pub fn configure_thread_pool(jobs: usize) {
    let mut builder = rayon::ThreadPoolBuilder::new().stack_size(RAYON_STACK_SIZE);

    if jobs > 0 {
        builder = builder.num_threads(jobs);
    }

    if let Err(e) = builder.build_global() {
        // Already configured
        tracing::debug!(error = %e, "thread pool already configured");
    }
}

/// Default filter for a `-v` count.
pub fn verbosity_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the stderr subscriber. `CPPSIG_LOG` wins over `-v`.
pub fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_filter(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity > 2)
        .with_level(true)
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("tracing initialized");
}
