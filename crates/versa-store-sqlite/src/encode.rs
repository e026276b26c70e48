//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, statuses as their upper-case
//! tag, payloads as compact JSON text and version numbers as `INTEGER`.

use chrono::{DateTime, Utc};
use versa_core::record::{DocumentStatus, Payload, VersionId, VersionRecord};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── DocumentStatus ──────────────────────────────────────────────────────────

pub fn encode_status(status: DocumentStatus) -> &'static str { status.into() }

pub fn decode_status(s: &str) -> Result<DocumentStatus> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown document status: {s:?}")))
}

// ─── VersionId ───────────────────────────────────────────────────────────────

pub fn encode_version(v: VersionId) -> Result<i64> {
  i64::try_from(v.get())
    .map_err(|_| Error::VersionOutOfRange(v))
}

pub fn decode_version(n: i64) -> Result<VersionId> {
  u64::try_from(n)
    .ok()
    .and_then(VersionId::new)
    .ok_or_else(|| Error::Decode(format!("non-positive version id: {n}")))
}

// ─── Payload ─────────────────────────────────────────────────────────────────

pub fn encode_payload(payload: &Payload) -> Result<String> {
  Ok(serde_json::to_string(payload)?)
}

pub fn decode_payload(id: &str, s: &str) -> Result<Payload> {
  match serde_json::from_str(s)? {
    serde_json::Value::Object(map) => Ok(map),
    _ => Err(Error::PayloadNotObject(id.to_owned())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawVersionRecord`].
pub const RECORD_COLUMNS: &str =
  "id, version_id, resource_type, last_updated, document_status, payload_json";

/// Raw values read directly from a `resource_versions` row.
pub struct RawVersionRecord {
  pub id:              String,
  pub version_id:      i64,
  pub resource_type:   String,
  pub last_updated:    String,
  pub document_status: String,
  pub payload_json:    String,
}

impl RawVersionRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      version_id:      row.get(1)?,
      resource_type:   row.get(2)?,
      last_updated:    row.get(3)?,
      document_status: row.get(4)?,
      payload_json:    row.get(5)?,
    })
  }

  pub fn into_record(self) -> Result<VersionRecord> {
    let payload = decode_payload(&self.id, &self.payload_json)?;
    Ok(VersionRecord {
      version_id: decode_version(self.version_id)?,
      last_updated: decode_dt(&self.last_updated)?,
      document_status: decode_status(&self.document_status)?,
      resource_type: self.resource_type,
      id: self.id,
      payload,
    })
  }
}
