//! The version fetcher, one store round-trip per resolver call.

use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::{
  Error, Result,
  record::VersionRecord,
  store::{StoreFailure, VersionStore},
};

/// Outcome of a fetch that reached the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
  /// No rows, or the store rejected the read on a key condition. Callers
  /// cannot tell these apart, and should not need to.
  Absent,
  /// At least one record, newest first.
  Versions(Vec<VersionRecord>),
}

/// Issues a single ordered query for all versions of one identifier.
pub struct VersionFetcher<S> {
  store:   Arc<S>,
  timeout: Option<Duration>,
}

impl<S> Clone for VersionFetcher<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), timeout: self.timeout }
  }
}

impl<S: VersionStore> VersionFetcher<S> {
  pub fn new(store: Arc<S>, timeout: Option<Duration>) -> Self {
    Self { store, timeout }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Fetch up to `limit` versions of `resource_type/id`, newest first.
  pub async fn fetch(
    &self,
    resource_type: &str,
    id: &str,
    limit: Option<usize>,
  ) -> Result<Fetched> {
    if resource_type.is_empty() {
      return Err(Error::InvalidRequest("resource type must not be empty".into()));
    }
    if id.is_empty() {
      return Err(Error::InvalidRequest("resource id must not be empty".into()));
    }

    let query = self.store.query(resource_type, id, limit);
    let outcome = match self.timeout {
      Some(bound) => tokio::time::timeout(bound, query).await.map_err(|_| {
        warn!(resource_type, id, ?bound, "version fetch timed out");
        Error::Timeout(bound)
      })?,
      None => query.await,
    };

    match outcome {
      Ok(records) if records.is_empty() => {
        debug!(resource_type, id, "no versions stored");
        Ok(Fetched::Absent)
      }
      Ok(records) => {
        if !records.windows(2).all(|w| w[0].version_id > w[1].version_id) {
          warn!(resource_type, id, "store returned versions out of order");
        }
        debug!(resource_type, id, count = records.len(), "fetched versions");
        Ok(Fetched::Versions(records))
      }
      Err(e) if e.is_condition_mismatch() => {
        debug!(resource_type, id, error = %e, "read condition did not hold");
        Ok(Fetched::Absent)
      }
      Err(e) => {
        warn!(resource_type, id, error = %e, "version fetch failed");
        Err(Error::Store(Box::new(e)))
      }
    }
  }
}
