use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber used by both binaries.
///
/// `RUST_LOG` wins over `default_filter`. Stdout is left alone because it
/// carries the metrics.
pub fn init(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}
