//! Version records: the stored snapshots the resolver chooses between.
//!
//! A record is one immutable snapshot of a logical resource at one version.
//! Records are written by an external write path; the resolver only ever reads
//! them. The only field that changes after a write is the status tag, and it
//! changes at most once (`PENDING` to a terminal state).

use std::{fmt, num::NonZeroU64, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// The JSON object body of a stored resource.
pub type Payload = serde_json::Map<String, serde_json::Value>;

// ─── Status ──────────────────────────────────────────────────────────────────

/// The visibility tag attached to a version at write time.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
  /// Committed and readable.
  Available,
  /// Written but not yet durable; invisible to readers.
  Pending,
  /// Committed tombstone (or a rolled-back write).
  Deleted,
}

impl DocumentStatus {
  /// `true` once a version has left `Pending`.
  pub fn is_terminal(self) -> bool { !matches!(self, Self::Pending) }

  /// The lifecycle only ever moves `Pending -> Available | Deleted`.
  pub fn can_transition_to(self, next: DocumentStatus) -> bool {
    matches!(
      (self, next),
      (Self::Pending, Self::Available) | (Self::Pending, Self::Deleted)
    )
  }
}

// ─── Version number ──────────────────────────────────────────────────────────

/// A positive, per-resource version number. Ordering between versions of the
/// same resource is decided by this value alone.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VersionId(NonZeroU64);

impl VersionId {
  /// The version assigned to the first write of a resource.
  pub const FIRST: VersionId = VersionId(NonZeroU64::MIN);

  /// Returns `None` for zero.
  pub fn new(value: u64) -> Option<Self> { NonZeroU64::new(value).map(Self) }

  pub fn get(self) -> u64 { self.0.get() }

  /// The version that follows this one, or `None` on overflow.
  pub fn next(self) -> Option<Self> { self.0.checked_add(1).map(Self) }
}

impl From<NonZeroU64> for VersionId {
  fn from(value: NonZeroU64) -> Self { Self(value) }
}

impl FromStr for VersionId {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    s.parse::<NonZeroU64>()
      .map(Self)
      .map_err(|_| crate::Error::InvalidRequest(format!("invalid version id: {s:?}")))
  }
}

impl fmt::Display for VersionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One stored snapshot of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
  /// Must match the type the caller asks for.
  pub resource_type:   String,
  /// Shared by every version of one logical resource.
  pub id:              String,
  pub version_id:      VersionId,
  /// Informational only; never used to order versions.
  pub last_updated:    DateTime<Utc>,
  pub document_status: DocumentStatus,
  pub payload:         Payload,
}
