// Logging module - Logging infrastructure
use std::io;
use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Build the filter: `RUST_LOG` wins, then the verbose flag, then the configured level
pub fn build_filter(log_level: &str, verbose: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = if verbose { "debug" } else { log_level };
    EnvFilter::try_new(format!("replcom={},warn", level))
        .unwrap_or_else(|_| EnvFilter::new("replcom=info,warn"))
}

/// Initialize logging system. Later calls are ignored.
pub fn init_logging(log_level: &str, verbose: bool) {
    INIT.call_once(|| {
        let result = tracing_subscriber::registry()
            .with(build_filter(log_level, verbose))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_thread_names(true)
                    .with_file(verbose)
                    .with_line_number(verbose),
            )
            .try_init();

        match result {
            Ok(()) => tracing::info!("ReplCom logging system initialized"),
            Err(e) => eprintln!("Logging already initialized: {}", e),
        }
    });
}
