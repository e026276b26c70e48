//! Error types for `versa-core`.

use std::time::Duration;

use thiserror::Error;

use crate::record::VersionId;

#[derive(Debug, Error)]
pub enum Error {
  /// The resource is absent under the requested type. Covers no rows, a type
  /// mismatch on the newest version, a deleted newest version on the
  /// latest-read path, and an all-pending history on the visible-read path.
  #[error("resource not found: {resource_type}/{id}")]
  NotFound { resource_type: String, id: String },

  /// A committed tombstone was found before any readable version.
  #[error("resource {resource_type}/{id} was deleted at version {version_id}")]
  ResourceDeleted {
    resource_type: String,
    id:            String,
    version_id:    VersionId,
  },

  #[error("version {version_id} of {resource_type}/{id} not found")]
  VersionNotFound {
    resource_type: String,
    id:            String,
    version_id:    VersionId,
  },

  #[error("invalid request: {0}")]
  InvalidRequest(String),

  #[error("version fetch timed out after {0:?}")]
  Timeout(Duration),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn not_found(resource_type: &str, id: &str) -> Self {
    Self::NotFound {
      resource_type: resource_type.to_owned(),
      id:            id.to_owned(),
    }
  }

  /// `true` for the "absent" family of outcomes.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::NotFound { .. } | Self::VersionNotFound { .. })
  }

  /// `true` when repeating the same call may succeed.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::Store(_) | Self::Timeout(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
