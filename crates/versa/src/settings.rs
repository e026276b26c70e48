//! Layered runtime settings.
//!
//! An optional TOML file is read first; `VERSA_*` environment variables
//! override it (e.g. `VERSA_STORE_PATH`, `VERSA_FETCH_TIMEOUT_MS`).

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use serde::Deserialize;
use versa_core::ResolverConfig;

use crate::Result;

/// Default settings file, resolved relative to the working directory.
pub const DEFAULT_PATH: &str = "versa.toml";

const ENV_PREFIX: &str = "VERSA";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
  /// SQLite database file. A leading `~/` is expanded against `$HOME`.
  pub store_path:       PathBuf,
  /// Bound on each version fetch, in milliseconds. Unbounded when absent.
  #[serde(default)]
  pub fetch_timeout_ms: Option<u64>,
}

impl Settings {
  /// Read `path` (if it exists) layered under the process environment.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    Self::load_with_env(path, config::Environment::with_prefix(ENV_PREFIX))
  }

  /// As [`Settings::load`], with an explicit environment source.
  pub fn load_with_env(
    path: impl AsRef<Path>,
    env: config::Environment,
  ) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.as_ref()).required(false))
      .add_source(env.try_parsing(true))
      .build()?;

    Ok(settings.try_deserialize()?)
  }

  /// The store path with `~` expanded.
  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn resolver_config(&self) -> ResolverConfig {
    ResolverConfig {
      fetch_timeout: self.fetch_timeout_ms.map(Duration::from_millis),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
