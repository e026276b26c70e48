//! Tracing initialisation for binaries embedding the resolver.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`, defaulting to `INFO`.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .try_init();
}
