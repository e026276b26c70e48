//! The visibility resolver.
//!
//! Both read paths share one fetch and one type check on the newest record,
//! then differ only in how they treat the status tags:
//!
//! | Newest versions            | `resolve_latest` | `resolve_latest_visible`  |
//! |----------------------------|------------------|---------------------------|
//! | `AVAILABLE`                | that version     | that version              |
//! | `PENDING`, then `AVAILABLE`| the pending one  | the available one         |
//! | `DELETED`                  | `NotFound`       | `ResourceDeleted(version)`|
//! | only `PENDING`             | the pending one  | `NotFound`                |
//!
//! Readers on the visible path therefore only ever observe committed state.

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  Error, Result,
  fetch::{Fetched, VersionFetcher},
  normalize::{NormalizedResource, normalize},
  record::{DocumentStatus, VersionId, VersionRecord},
  store::VersionStore,
};

/// The message carried by every successful resolution.
pub const FOUND_MESSAGE: &str = "Resource found";

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverConfig {
  /// Upper bound on the single store round-trip. `None` leaves the fetch
  /// bounded only by the caller dropping the future.
  pub fetch_timeout: Option<Duration>,
}

// ─── Result envelope ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedResource {
  pub message:  String,
  pub resource: NormalizedResource,
}

impl ResolvedResource {
  fn found(record: VersionRecord) -> Self {
    Self { message: FOUND_MESSAGE.to_owned(), resource: normalize(record) }
  }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Resolves one `(resource_type, id)` to one version snapshot per call.
///
/// Cloning is cheap; the store is reference-counted.
pub struct Resolver<S> {
  fetcher: VersionFetcher<S>,
}

impl<S> Clone for Resolver<S> {
  fn clone(&self) -> Self { Self { fetcher: self.fetcher.clone() } }
}

impl<S: VersionStore> Resolver<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self::with_config(store, ResolverConfig::default())
  }

  pub fn with_config(store: Arc<S>, config: ResolverConfig) -> Self {
    Self { fetcher: VersionFetcher::new(store, config.fetch_timeout) }
  }

  pub fn store(&self) -> &Arc<S> { self.fetcher.store() }

  /// The most recent version regardless of whether it is committed.
  ///
  /// A deleted newest version is reported as plain [`Error::NotFound`].
  pub async fn resolve_latest(
    &self,
    resource_type: &str,
    id: &str,
  ) -> Result<ResolvedResource> {
    let newest = self
      .versions_of_type(resource_type, id, Some(1))
      .await?
      .into_iter()
      .next()
      .ok_or_else(|| Error::not_found(resource_type, id))?;

    match newest.document_status {
      DocumentStatus::Deleted => {
        debug!(resource_type, id, version = %newest.version_id, "newest version is deleted");
        Err(Error::not_found(resource_type, id))
      }
      DocumentStatus::Available | DocumentStatus::Pending => {
        Ok(ResolvedResource::found(newest))
      }
    }
  }

  /// The most recent committed version, skipping writes still in flight.
  ///
  /// A committed tombstone reached before any available version is reported
  /// as [`Error::ResourceDeleted`] with its version number.
  pub async fn resolve_latest_visible(
    &self,
    resource_type: &str,
    id: &str,
  ) -> Result<ResolvedResource> {
    let versions = self.versions_of_type(resource_type, id, None).await?;

    for record in versions {
      match record.document_status {
        DocumentStatus::Pending => {
          debug!(resource_type, id, version = %record.version_id, "skipping pending version");
        }
        DocumentStatus::Available => return Ok(ResolvedResource::found(record)),
        DocumentStatus::Deleted => {
          return Err(Error::ResourceDeleted {
            resource_type: resource_type.to_owned(),
            id:            id.to_owned(),
            version_id:    record.version_id,
          });
        }
      }
    }

    debug!(resource_type, id, "every version is pending");
    Err(Error::not_found(resource_type, id))
  }

  /// One specific committed version.
  pub async fn resolve_version(
    &self,
    resource_type: &str,
    id: &str,
    version_id: VersionId,
  ) -> Result<ResolvedResource> {
    let versions = self.versions_of_type(resource_type, id, None).await?;

    let version_not_found = || Error::VersionNotFound {
      resource_type: resource_type.to_owned(),
      id: id.to_owned(),
      version_id,
    };

    let record = versions
      .into_iter()
      .find(|r| r.version_id == version_id)
      .ok_or_else(version_not_found)?;

    match record.document_status {
      DocumentStatus::Available => Ok(ResolvedResource::found(record)),
      DocumentStatus::Deleted => Err(Error::ResourceDeleted {
        resource_type: resource_type.to_owned(),
        id: id.to_owned(),
        version_id,
      }),
      DocumentStatus::Pending => Err(version_not_found()),
    }
  }

  /// Fetch and reject everything that does not exist under `resource_type`.
  /// The returned sequence is non-empty and newest first.
  async fn versions_of_type(
    &self,
    resource_type: &str,
    id: &str,
    limit: Option<usize>,
  ) -> Result<Vec<VersionRecord>> {
    let versions = match self.fetcher.fetch(resource_type, id, limit).await? {
      Fetched::Absent => return Err(Error::not_found(resource_type, id)),
      Fetched::Versions(versions) => versions,
    };

    match versions.first() {
      Some(newest) if newest.resource_type == resource_type => Ok(versions),
      Some(newest) => {
        debug!(
          resource_type,
          id,
          stored_type = %newest.resource_type,
          "newest version has a different resource type"
        );
        Err(Error::not_found(resource_type, id))
      }
      None => Err(Error::not_found(resource_type, id)),
    }
  }
}
