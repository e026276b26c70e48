//! The `VersionStore` trait implemented by storage backends.
//!
//! Backends (e.g. `versa-store-sqlite`) own the data and its write path. The
//! resolver depends only on this read-side abstraction.

use std::future::Future;

use crate::record::VersionRecord;

/// Classification hook for backend errors.
///
/// A backend whose reads can be rejected by a key condition (a stale or
/// mismatched key) reports that here so the fetcher can treat it as an absent
/// resource instead of a failure.
pub trait StoreFailure: std::error::Error + Send + Sync + 'static {
  fn is_condition_mismatch(&self) -> bool { false }
}

/// A key-ordered store of resource versions.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait VersionStore: Send + Sync {
  type Error: StoreFailure;

  /// Return the versions stored under `id`, newest first (descending
  /// `version_id`), at most `limit` of them when a limit is given.
  ///
  /// `resource_type` is the caller's requested type. Backends may use it as a
  /// read condition but must not filter on it silently; the resolver checks
  /// the type of the newest record itself.
  fn query<'a>(
    &'a self,
    resource_type: &'a str,
    id: &'a str,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<VersionRecord>, Self::Error>> + Send + 'a;
}
