//! Resolver tests against an in-memory fixture store.

use std::{
  sync::{Arc, Mutex},
  time::Duration,
};

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use crate::{
  Error, Resolver, ResolverConfig,
  record::{DocumentStatus, VersionId, VersionRecord},
  resolve::FOUND_MESSAGE,
  store::{StoreFailure, VersionStore},
};

// ─── Fixture store ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, thiserror::Error)]
enum FixtureError {
  #[error("conditional check failed")]
  ConditionMismatch,
  #[error("store unavailable")]
  Unavailable,
}

impl StoreFailure for FixtureError {
  fn is_condition_mismatch(&self) -> bool {
    matches!(self, Self::ConditionMismatch)
  }
}

#[derive(Default)]
struct FixtureStore {
  versions: Vec<VersionRecord>,
  failure:  Option<FixtureError>,
  delay:    Option<Duration>,
  limits:   Mutex<Vec<Option<usize>>>,
}

impl FixtureStore {
  fn with(versions: Vec<VersionRecord>) -> Self {
    Self { versions, ..Self::default() }
  }

  fn failing(failure: FixtureError) -> Self {
    Self { failure: Some(failure), ..Self::default() }
  }
}

impl VersionStore for FixtureStore {
  type Error = FixtureError;

  async fn query(
    &self,
    _resource_type: &str,
    id: &str,
    limit: Option<usize>,
  ) -> Result<Vec<VersionRecord>, FixtureError> {
    self.limits.lock().unwrap().push(limit);

    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    if let Some(failure) = self.failure {
      return Err(failure);
    }

    let mut rows: Vec<VersionRecord> =
      self.versions.iter().filter(|r| r.id == id).cloned().collect();
    rows.sort_by(|a, b| b.version_id.cmp(&a.version_id));
    if let Some(limit) = limit {
      rows.truncate(limit);
    }
    Ok(rows)
  }
}

fn resolver(store: FixtureStore) -> Resolver<FixtureStore> {
  Resolver::new(Arc::new(store))
}

fn at(day: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap()
}

fn version(
  resource_type: &str,
  version: u64,
  status: DocumentStatus,
) -> VersionRecord {
  VersionRecord {
    resource_type:   resource_type.into(),
    id:              "abc".into(),
    version_id:      VersionId::new(version).unwrap(),
    last_updated:    at(version as u32),
    document_status: status,
    payload:         json!({
      "resourceType":   resource_type,
      "id":             "abc",
      "documentStatus": status.to_string(),
      "note":           format!("v{version}"),
    })
    .as_object()
    .cloned()
    .unwrap(),
  }
}

fn patient(v: u64, status: DocumentStatus) -> VersionRecord {
  version("Patient", v, status)
}

fn note(resolved: &crate::ResolvedResource) -> &str {
  resolved.resource.get("note").and_then(|n| n.as_str()).unwrap()
}

use DocumentStatus::{Available, Deleted, Pending};

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn two_available_versions_resolve_to_newest() {
  let r = resolver(FixtureStore::with(vec![
    patient(2, Available),
    patient(1, Available),
  ]));

  let latest = r.resolve_latest("Patient", "abc").await.unwrap();
  assert_eq!(latest.message, FOUND_MESSAGE);
  assert_eq!(latest.resource.version_id(), Some("2"));

  let visible = r.resolve_latest_visible("Patient", "abc").await.unwrap();
  assert_eq!(visible.resource.version_id(), Some("2"));
  assert_eq!(note(&visible), "v2");
}

#[tokio::test]
async fn pending_newest_is_latest_but_not_visible() {
  let r = resolver(FixtureStore::with(vec![
    patient(2, Pending),
    patient(1, Available),
  ]));

  let latest = r.resolve_latest("Patient", "abc").await.unwrap();
  assert_eq!(latest.resource.version_id(), Some("2"));
  assert!(latest.resource.get("documentStatus").is_none());

  let visible = r.resolve_latest_visible("Patient", "abc").await.unwrap();
  assert_eq!(visible.resource.version_id(), Some("1"));
  assert_eq!(note(&visible), "v1");
}

#[tokio::test]
async fn deleted_newest_is_not_found_on_latest_and_deleted_on_visible() {
  let r = resolver(FixtureStore::with(vec![
    patient(2, Deleted),
    patient(1, Available),
  ]));

  let err = r.resolve_latest("Patient", "abc").await.unwrap_err();
  assert!(matches!(err, Error::NotFound { .. }), "got {err:?}");

  let err = r.resolve_latest_visible("Patient", "abc").await.unwrap_err();
  match err {
    Error::ResourceDeleted { resource_type, id, version_id } => {
      assert_eq!(resource_type, "Patient");
      assert_eq!(id, "abc");
      assert_eq!(version_id.get(), 2);
    }
    other => panic!("expected ResourceDeleted, got {other:?}"),
  }
}

#[tokio::test]
async fn empty_history_is_not_found_on_both_paths() {
  let r = resolver(FixtureStore::default());

  let err = r.resolve_latest("Patient", "abc").await.unwrap_err();
  assert!(matches!(
    err,
    Error::NotFound { ref resource_type, ref id } if resource_type == "Patient" && id == "abc"
  ));
  let err = r.resolve_latest_visible("Patient", "abc").await.unwrap_err();
  assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn mismatched_type_is_not_found_on_both_paths() {
  let r = resolver(FixtureStore::with(vec![version(
    "Observation",
    1,
    Available,
  )]));

  let err = r.resolve_latest("Patient", "abc").await.unwrap_err();
  assert!(matches!(err, Error::NotFound { .. }));
  let err = r.resolve_latest_visible("Patient", "abc").await.unwrap_err();
  assert!(matches!(err, Error::NotFound { .. }));
  let err = r
    .resolve_version("Patient", "abc", VersionId::FIRST)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound { .. }));
}

// ─── Properties ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn latest_ignores_last_updated() {
  let mut newest = patient(3, Available);
  newest.last_updated = at(1);
  let mut oldest = patient(1, Available);
  oldest.last_updated = at(28);

  let r = resolver(FixtureStore::with(vec![
    oldest,
    patient(2, Available),
    newest,
  ]));

  let latest = r.resolve_latest("Patient", "abc").await.unwrap();
  assert_eq!(latest.resource.version_id(), Some("3"));
  assert_eq!(
    latest.resource.last_updated(),
    Some("2024-03-01T09:00:00.000Z")
  );
}

#[tokio::test]
async fn latest_asks_for_one_row_and_visible_for_all() {
  let store = Arc::new(FixtureStore::with(vec![patient(1, Available)]));
  let r = Resolver::new(Arc::clone(&store));

  r.resolve_latest("Patient", "abc").await.unwrap();
  r.resolve_latest_visible("Patient", "abc").await.unwrap();

  assert_eq!(*store.limits.lock().unwrap(), vec![Some(1), None]);
}

#[tokio::test]
async fn visible_skips_a_run_of_pending_versions() {
  let r = resolver(FixtureStore::with(vec![
    patient(5, Pending),
    patient(4, Pending),
    patient(3, Available),
    patient(2, Deleted),
  ]));

  let visible = r.resolve_latest_visible("Patient", "abc").await.unwrap();
  assert_eq!(visible.resource.version_id(), Some("3"));
}

#[tokio::test]
async fn visible_reports_tombstone_behind_pending() {
  let r = resolver(FixtureStore::with(vec![
    patient(3, Pending),
    patient(2, Deleted),
    patient(1, Available),
  ]));

  let err = r.resolve_latest_visible("Patient", "abc").await.unwrap_err();
  assert!(matches!(
    err,
    Error::ResourceDeleted { version_id, .. } if version_id.get() == 2
  ));

  // The latest path only looks at the pending head.
  let latest = r.resolve_latest("Patient", "abc").await.unwrap();
  assert_eq!(latest.resource.version_id(), Some("3"));
}

#[tokio::test]
async fn all_pending_is_not_found_on_visible() {
  let r = resolver(FixtureStore::with(vec![
    patient(2, Pending),
    patient(1, Pending),
  ]));

  let err = r.resolve_latest_visible("Patient", "abc").await.unwrap_err();
  assert!(matches!(err, Error::NotFound { .. }));
  assert!(err.is_not_found());
}

#[tokio::test]
async fn duplicate_version_rows_do_not_panic() {
  let r = resolver(FixtureStore::with(vec![
    patient(2, Pending),
    patient(2, Available),
    patient(1, Available),
  ]));

  let visible = r.resolve_latest_visible("Patient", "abc").await.unwrap();
  assert_eq!(visible.resource.version_id(), Some("2"));
  let latest = r.resolve_latest("Patient", "abc").await.unwrap();
  assert_eq!(latest.resource.version_id(), Some("2"));
}

// ─── Versioned read ──────────────────────────────────────────────────────────

#[tokio::test]
async fn resolve_version_by_status() {
  let r = resolver(FixtureStore::with(vec![
    patient(4, Pending),
    patient(3, Deleted),
    patient(2, Available),
  ]));
  let v = |n| VersionId::new(n).unwrap();

  let found = r.resolve_version("Patient", "abc", v(2)).await.unwrap();
  assert_eq!(note(&found), "v2");

  let err = r.resolve_version("Patient", "abc", v(3)).await.unwrap_err();
  assert!(matches!(err, Error::ResourceDeleted { version_id, .. } if version_id == v(3)));

  let err = r.resolve_version("Patient", "abc", v(4)).await.unwrap_err();
  assert!(matches!(err, Error::VersionNotFound { version_id, .. } if version_id == v(4)));

  let err = r.resolve_version("Patient", "abc", v(9)).await.unwrap_err();
  assert!(matches!(err, Error::VersionNotFound { .. }));
  assert!(err.is_not_found());
}

// ─── Fetch boundary ──────────────────────────────────────────────────────────

#[tokio::test]
async fn condition_mismatch_is_not_found() {
  let r = resolver(FixtureStore::failing(FixtureError::ConditionMismatch));

  let err = r.resolve_latest("Patient", "abc").await.unwrap_err();
  assert!(matches!(err, Error::NotFound { .. }));
  let err = r.resolve_latest_visible("Patient", "abc").await.unwrap_err();
  assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn other_store_failures_pass_through() {
  let r = resolver(FixtureStore::failing(FixtureError::Unavailable));

  let err = r.resolve_latest("Patient", "abc").await.unwrap_err();
  assert!(matches!(err, Error::Store(_)));
  assert!(err.is_retryable());
  assert_eq!(err.to_string(), "store error: store unavailable");
}

#[tokio::test]
async fn empty_identifiers_are_rejected() {
  let store = Arc::new(FixtureStore::with(vec![patient(1, Available)]));
  let r = Resolver::new(Arc::clone(&store));

  let err = r.resolve_latest("", "abc").await.unwrap_err();
  assert!(matches!(err, Error::InvalidRequest(_)));
  let err = r.resolve_latest_visible("Patient", "").await.unwrap_err();
  assert!(matches!(err, Error::InvalidRequest(_)));

  assert!(store.limits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn slow_fetch_times_out() {
  let store = FixtureStore {
    versions: vec![patient(1, Available)],
    delay: Some(Duration::from_millis(500)),
    ..FixtureStore::default()
  };
  let r = Resolver::with_config(
    Arc::new(store),
    ResolverConfig { fetch_timeout: Some(Duration::from_millis(10)) },
  );

  let err = r.resolve_latest("Patient", "abc").await.unwrap_err();
  assert!(matches!(err, Error::Timeout(d) if d == Duration::from_millis(10)));
  assert!(err.is_retryable());
}

#[tokio::test]
async fn fast_fetch_within_timeout_succeeds() {
  let r = Resolver::with_config(
    Arc::new(FixtureStore::with(vec![patient(1, Available)])),
    ResolverConfig { fetch_timeout: Some(Duration::from_secs(5)) },
  );

  let found = r.resolve_latest_visible("Patient", "abc").await.unwrap();
  assert_eq!(found.resource.version_id(), Some("1"));
}

#[tokio::test]
async fn envelope_serializes_with_message() {
  let r = resolver(FixtureStore::with(vec![patient(1, Available)]));
  let found = r.resolve_latest("Patient", "abc").await.unwrap();

  let value = serde_json::to_value(&found).unwrap();
  assert_eq!(value["message"], json!("Resource found"));
  assert_eq!(value["resource"]["resourceType"], json!("Patient"));
  assert_eq!(value["resource"]["meta"]["versionId"], json!("1"));
}

// ─── Record types ────────────────────────────────────────────────────────────

#[test]
fn status_lifecycle_is_one_way() {
  assert!(Pending.can_transition_to(Available));
  assert!(Pending.can_transition_to(Deleted));
  assert!(!Available.can_transition_to(Deleted));
  assert!(!Deleted.can_transition_to(Available));
  assert!(!Available.can_transition_to(Pending));
  assert!(Available.is_terminal() && Deleted.is_terminal());
  assert!(!Pending.is_terminal());
}

#[test]
fn status_tags_are_upper_case() {
  assert_eq!(Available.to_string(), "AVAILABLE");
  assert_eq!("DELETED".parse::<DocumentStatus>().unwrap(), Deleted);
  assert_eq!(serde_json::to_value(Pending).unwrap(), json!("PENDING"));
}

#[test]
fn version_ids_are_positive() {
  assert!(VersionId::new(0).is_none());
  assert_eq!(VersionId::FIRST.get(), 1);
  assert_eq!(VersionId::FIRST.next().unwrap().to_string(), "2");
  assert!(serde_json::from_value::<VersionId>(json!(0)).is_err());
  assert_eq!("12".parse::<VersionId>().unwrap().get(), 12);
  assert!(matches!("0".parse::<VersionId>(), Err(Error::InvalidRequest(_))));
  assert!("-3".parse::<VersionId>().is_err());
}
