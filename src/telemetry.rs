use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber for the binaries.
///
/// Level comes from `RUST_LOG` (default `info`), e.g.
/// `RUST_LOG=dashboard=debug cargo run --bin dashboard-server`.
/// Records emitted through `log` are forwarded to the same subscriber. Output
/// goes to stderr so reports written to stdout stay clean.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
