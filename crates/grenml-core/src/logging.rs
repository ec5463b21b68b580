use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"grenml_core=info"`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging(default_directive: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(default_directive),
    };
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
    {
        tracing::info!("GRENML core v{} initialized", env!("CARGO_PKG_VERSION"));
    }
    Ok(())
}
