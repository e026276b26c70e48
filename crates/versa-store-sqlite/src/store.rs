//! [`SqliteVersionStore`]: the SQLite implementation of [`VersionStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tracing::debug;
use versa_core::{
  record::{DocumentStatus, Payload, VersionId, VersionRecord},
  store::VersionStore,
};

use crate::{
  Error, Result,
  encode::{
    RECORD_COLUMNS, RawVersionRecord, decode_status, decode_version, encode_dt,
    encode_payload, encode_status, encode_version,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A version store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteVersionStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteVersionStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Write lifecycle ───────────────────────────────────────────────────────

  /// Insert a fully-built record as-is. Used for imports; a duplicate
  /// `(id, version_id)` is rejected by the primary key.
  pub async fn insert_record(&self, record: &VersionRecord) -> Result<()> {
    let id            = record.id.clone();
    let version       = encode_version(record.version_id)?;
    let resource_type = record.resource_type.clone();
    let at_str        = encode_dt(record.last_updated);
    let status_str    = encode_status(record.document_status);
    let payload_str   = encode_payload(&record.payload)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO resource_versions (
             id, version_id, resource_type, last_updated, document_status, payload_json
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id,
            version,
            resource_type,
            at_str,
            status_str,
            payload_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Write the next version of `id` in the `PENDING` state.
  ///
  /// The version number is one past the highest stored for `id` (or 1), and
  /// is allocated and inserted in one transaction.
  pub async fn put_pending(
    &self,
    resource_type: &str,
    id: &str,
    payload: Payload,
  ) -> Result<VersionRecord> {
    let last_updated = Utc::now();

    let id_str      = id.to_owned();
    let type_str    = resource_type.to_owned();
    let at_str      = encode_dt(last_updated);
    let payload_str = encode_payload(&payload)?;
    let pending     = encode_status(DocumentStatus::Pending);

    let allocated: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let highest: Option<i64> = tx.query_row(
          "SELECT MAX(version_id) FROM resource_versions WHERE id = ?1",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?;
        let Some(next) = highest.unwrap_or(0).checked_add(1) else {
          return Ok(None);
        };
        tx.execute(
          "INSERT INTO resource_versions (
             id, version_id, resource_type, last_updated, document_status, payload_json
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, next, type_str, at_str, pending, payload_str],
        )?;
        tx.commit()?;
        Ok(Some(next))
      })
      .await?;

    let version_id = decode_version(
      allocated.ok_or_else(|| Error::VersionOverflow(id.to_owned()))?,
    )?;
    debug!(resource_type, id, %version_id, "wrote pending version");

    Ok(VersionRecord {
      resource_type: resource_type.to_owned(),
      id: id.to_owned(),
      version_id,
      last_updated,
      document_status: DocumentStatus::Pending,
      payload,
    })
  }

  /// Mark a pending version durable and readable.
  pub async fn commit(&self, id: &str, version_id: VersionId) -> Result<()> {
    self.transition(id, version_id, DocumentStatus::Available).await
  }

  /// Mark a pending version as a tombstone (deletion or rollback).
  pub async fn tombstone(&self, id: &str, version_id: VersionId) -> Result<()> {
    self.transition(id, version_id, DocumentStatus::Deleted).await
  }

  /// Move a version out of `PENDING`. The status guard lives in the `UPDATE`
  /// itself so a terminal version is never rewritten.
  async fn transition(
    &self,
    id: &str,
    version_id: VersionId,
    to: DocumentStatus,
  ) -> Result<()> {
    let id_str  = id.to_owned();
    let version = encode_version(version_id)?;
    let to_str  = encode_status(to);
    let pending = encode_status(DocumentStatus::Pending);

    let (changed, current): (usize, Option<String>) = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE resource_versions SET document_status = ?3
           WHERE id = ?1 AND version_id = ?2 AND document_status = ?4",
          rusqlite::params![id_str, version, to_str, pending],
        )?;
        if changed > 0 {
          return Ok((changed, None));
        }
        let current: Option<String> = conn
          .query_row(
            "SELECT document_status FROM resource_versions
             WHERE id = ?1 AND version_id = ?2",
            rusqlite::params![id_str, version],
            |r| r.get(0),
          )
          .optional()?;
        Ok((0, current))
      })
      .await?;

    if changed > 0 {
      debug!(id, %version_id, status = %to, "version status changed");
      return Ok(());
    }

    match current {
      None => Err(Error::VersionNotFound { id: id.to_owned(), version_id }),
      Some(from) => Err(Error::InvalidTransition {
        id: id.to_owned(),
        version_id,
        from: decode_status(&from)?,
        to,
      }),
    }
  }
}

// ─── VersionStore impl ───────────────────────────────────────────────────────

impl VersionStore for SqliteVersionStore {
  type Error = Error;

  async fn query(
    &self,
    resource_type: &str,
    id: &str,
    limit: Option<usize>,
  ) -> Result<Vec<VersionRecord>> {
    let id_str = id.to_owned();
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val = limit
      .and_then(|l| i64::try_from(l).ok())
      .unwrap_or(-1);

    let raws: Vec<RawVersionRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RECORD_COLUMNS}
           FROM resource_versions
           WHERE id = ?1
           ORDER BY version_id DESC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![id_str, limit_val],
            RawVersionRecord::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    debug!(resource_type, id, rows = raws.len(), "queried versions");
    raws.into_iter().map(RawVersionRecord::into_record).collect()
  }
}
