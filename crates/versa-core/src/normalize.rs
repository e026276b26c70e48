//! The caller-facing shape of a resolved version.
//!
//! Every success path of the resolver goes through [`normalize`]: internal
//! bookkeeping is stripped from the payload and the selected record's version
//! number and write time are folded into the resource's `meta` block.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{Payload, VersionRecord};

/// Payload keys owned by the storage layer, never shown to callers.
pub const INTERNAL_FIELDS: [&str; 3] = ["documentStatus", "vid", "lockEndTs"];

/// A resource body ready to hand to a reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedResource(Payload);

impl NormalizedResource {
  pub fn get(&self, key: &str) -> Option<&Value> { self.0.get(key) }

  /// `meta.versionId`, a decimal string.
  pub fn version_id(&self) -> Option<&str> { self.meta_str("versionId") }

  /// `meta.lastUpdated`, RFC 3339 with millisecond precision.
  pub fn last_updated(&self) -> Option<&str> { self.meta_str("lastUpdated") }

  pub fn as_object(&self) -> &Payload { &self.0 }

  pub fn into_inner(self) -> Payload { self.0 }

  fn meta_str(&self, key: &str) -> Option<&str> {
    self.0.get("meta")?.get(key)?.as_str()
  }
}

/// Reshape a stored record into its reader-facing form.
///
/// Keys already present under `meta` (tags, profiles, ...) are kept; only
/// `versionId` and `lastUpdated` are overwritten from the record.
pub fn normalize(record: VersionRecord) -> NormalizedResource {
  let mut body = record.payload;
  for field in INTERNAL_FIELDS {
    body.remove(field);
  }

  let mut meta = match body.remove("meta") {
    Some(Value::Object(meta)) => meta,
    _ => Payload::new(),
  };
  meta.insert(
    "versionId".to_owned(),
    Value::String(record.version_id.to_string()),
  );
  meta.insert(
    "lastUpdated".to_owned(),
    Value::String(
      record
        .last_updated
        .to_rfc3339_opts(SecondsFormat::Millis, true),
    ),
  );
  body.insert("meta".to_owned(), Value::Object(meta));

  NormalizedResource(body)
}
