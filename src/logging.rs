use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Overrides `RUST_LOG` when set.
pub const LOG_ENV: &str = "RETIRE_LOG";

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(format!("retire={default_level}")))
}

/// Log to stderr so report output on stdout stays clean.
pub fn init_logging(default_level: &str) {
    let result = tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .try_init();
    if let Err(e) = result {
        eprintln!("Warning: logging already initialized: {e}");
    }
}
