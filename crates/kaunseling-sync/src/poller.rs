//! Periodic pull of the mirrored collections.
//!
//! Each tick fetches `records` and `feedbacks` without holding the dashboard
//! lock, then swaps the snapshot in unless the collection was written locally
//! while the fetch was in flight. A failed fetch keeps the local copy; the
//! next tick is the only retry.

use std::sync::Arc;
use std::time::Duration;

use kaunseling_core::{CollectionKind, RemoteMirror};
use kaunseling_store::Dashboard;
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Outcome of one refresh pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub applied: Vec<CollectionKind>,
    /// Snapshots dropped because a local write landed during the fetch.
    pub stale: Vec<CollectionKind>,
    pub failed: Vec<(CollectionKind, String)>,
}

impl RefreshReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Kinds that have a remote module.
fn mirrored_kinds() -> impl Iterator<Item = CollectionKind> {
    CollectionKind::ALL
        .into_iter()
        .filter(|k| k.remote_module().is_some())
}

/// Unwrap stored `{module, data}` envelopes into the latest snapshot; bare
/// records pass through unchanged.
fn snapshot_records(results: Vec<JsonValue>) -> Vec<JsonValue> {
    let is_envelope = |v: &JsonValue| v.get("module").is_some() && v.get("data").map_or(false, JsonValue::is_array);
    if results.is_empty() || !results.iter().all(is_envelope) {
        return results;
    }
    match results.into_iter().last().and_then(|mut v| v.get_mut("data").map(JsonValue::take)) {
        Some(JsonValue::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// Fetch every mirrored collection once and apply the successful ones.
pub async fn refresh_once(dashboard: &Mutex<Dashboard>, mirror: &dyn RemoteMirror) -> RefreshReport {
    let mut report = RefreshReport::default();

    for kind in mirrored_kinds() {
        let Some(module) = kind.remote_module() else {
            continue;
        };
        let fetched_at = dashboard.lock().await.revision(kind);
        let fetched = match mirror.fetch(module).await {
            Ok(results) => snapshot_records(results),
            Err(e) => {
                warn!(subsystem = "sync", module, error = %e, "Remote fetch failed, keeping local copy");
                report.failed.push((kind, e.to_string()));
                continue;
            }
        };

        let count = fetched.len();
        let mut guard = dashboard.lock().await;
        match guard.apply_remote(kind, fetched, fetched_at).await {
            Ok(true) => {
                debug!(subsystem = "sync", module, count, "Remote snapshot applied");
                report.applied.push(kind);
            }
            Ok(false) => report.stale.push(kind),
            Err(e) => {
                warn!(subsystem = "sync", module, error = %e, "Remote snapshot rejected, keeping local copy");
                report.failed.push((kind, e.to_string()));
            }
        }
    }

    report
}

/// Run [`refresh_once`] now and then every `interval` until the handle is
/// aborted.
pub fn spawn_poller(
    dashboard: Arc<Mutex<Dashboard>>,
    mirror: Arc<dyn RemoteMirror>,
    interval: Duration,
) -> JoinHandle<()> {
    info!(
        subsystem = "sync",
        interval_secs = interval.as_secs(),
        "Starting remote poller"
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let report = refresh_once(&dashboard, mirror.as_ref()).await;
            debug!(
                subsystem = "sync",
                applied = report.applied.len(),
                stale = report.stale.len(),
                failed = report.failed.len(),
                "Remote refresh finished"
            );
        }
    })
}
