//! Error type for `versa-store-sqlite`.

use thiserror::Error;
use versa_core::{
  record::{DocumentStatus, VersionId},
  store::StoreFailure,
};

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("corrupt row: {0}")]
  Decode(String),

  /// The payload of a record must be a JSON object.
  #[error("payload for {0} is not a JSON object")]
  PayloadNotObject(String),

  #[error("version {version_id} of {id} not found")]
  VersionNotFound { id: String, version_id: VersionId },

  #[error("cannot move version {version_id} of {id} from {from} to {to}")]
  InvalidTransition {
    id:         String,
    version_id: VersionId,
    from:       DocumentStatus,
    to:         DocumentStatus,
  },

  #[error("version {0} exceeds the INTEGER column range")]
  VersionOutOfRange(VersionId),

  #[error("version counter exhausted for {0}")]
  VersionOverflow(String),
}

// SQLite reads have no key conditions; every failure is a real one.
impl StoreFailure for Error {}

pub type Result<T, E = Error> = std::result::Result<T, E>;
