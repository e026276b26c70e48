//! Embedding facade for the Versa resolver.
//!
//! Loads [`Settings`], opens the SQLite version store they point at, and
//! hands back a configured [`Resolver`]. Transport and API layers are the
//! caller's responsibility.
//!
//! ```rust,ignore
//! versa::telemetry::init();
//! let settings = versa::Settings::load("versa.toml")?;
//! let resolver = versa::open(&settings).await?;
//! let found = resolver.resolve_latest_visible("Patient", "abc").await?;
//! ```

pub mod error;
pub mod settings;
pub mod telemetry;

use std::sync::Arc;

pub use error::{Error, Result};
pub use settings::Settings;
pub use versa_core::{self, ResolvedResource, Resolver};
pub use versa_store_sqlite::SqliteVersionStore;

/// Open the configured store and build a resolver over it.
pub async fn open(settings: &Settings) -> Result<Resolver<SqliteVersionStore>> {
  let store_path = settings.store_path();
  let store = SqliteVersionStore::open(&store_path).await?;
  tracing::info!(path = %store_path.display(), "opened version store");

  Ok(Resolver::with_config(Arc::new(store), settings.resolver_config()))
}
