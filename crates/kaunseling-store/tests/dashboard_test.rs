//! Dashboard behavior over in-memory and on-disk stores.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kaunseling_core::defaults::PROFILE_KEY;
use kaunseling_core::{
    ingest_file, CollectionKind, Error, IngestLimits, KeyValueStore, KpiKind, ProfileList, RemoteMirror, Result,
    SessionState, SumbanganCategory,
};
use kaunseling_store::{Dashboard, FilesystemStore, InteractionTarget, MemoryStore};
use serde_json::{json, Value as JsonValue};
use tokio::sync::mpsc;

const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];

fn owner() -> SessionState {
    SessionState {
        is_owner: true,
        sessions_unlocked: true,
    }
}

fn visitor() -> SessionState {
    SessionState::default()
}

fn program() -> JsonValue {
    json!({
        "focusArea": "Peningkatan disiplin diri murid",
        "namaProgram": "ceramah disiplin",
        "tarikhMula": "2026-02-01",
        "tarikhTamat": "2026-02-01",
        "tempat": "dewan",
        "sasaran": "semua murid",
        "penyelaras": "cikgu lily",
        "sumbangan": ""
    })
}

fn feedback() -> JsonValue {
    json!({"name": "ibu ali", "comment": "bilik kaunseling selesa", "rating": 5})
}

async fn memory_dashboard() -> (Arc<MemoryStore>, Dashboard) {
    let store = Arc::new(MemoryStore::new());
    let dashboard = Dashboard::load(store.clone()).await;
    (store, dashboard)
}

/// Records every push it receives.
struct RecordingMirror {
    tx: mpsc::UnboundedSender<(String, JsonValue)>,
}

#[async_trait]
impl RemoteMirror for RecordingMirror {
    async fn push(&self, module: &str, data: &JsonValue) -> Result<()> {
        let _ = self.tx.send((module.to_string(), data.clone()));
        Ok(())
    }

    async fn fetch(&self, _module: &str) -> Result<Vec<JsonValue>> {
        Ok(Vec::new())
    }
}

/// Store whose writes always fail.
struct ReadOnlyStore;

#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        )))
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_empty_store_loads_defaults() {
    let (_store, dashboard) = memory_dashboard().await;
    for kind in CollectionKind::ALL {
        assert!(dashboard.collection(kind).is_empty());
    }
    assert_eq!(dashboard.profile().name, "CIKGU LILY");
}

#[tokio::test]
async fn test_unparsable_document_starts_empty() {
    let store = Arc::new(MemoryStore::with_entries([
        ("counseling_records", "{not json"),
        ("counseling_meeting", r#"[{"id":"m1","tarikh":"1/1","masa":"8:00","tempat":"BILIK","namaMesyuarat":"PLC","images":[],"createdAt":1700000000000}]"#),
        (PROFILE_KEY, "null"),
    ]));
    let dashboard = Dashboard::load(store).await;
    assert!(dashboard.collection(CollectionKind::Records).is_empty());
    assert_eq!(dashboard.collection(CollectionKind::Meeting).len(), 1);
    assert_eq!(dashboard.profile().name, "CIKGU LILY");
}

#[tokio::test]
async fn test_create_persists_whole_collection() {
    let (store, mut dashboard) = memory_dashboard().await;
    let created = dashboard
        .create(CollectionKind::Records, program(), &owner())
        .await
        .unwrap();
    assert_eq!(created["namaProgram"], "CERAMAH DISIPLIN");

    let document = store.get("counseling_records").await.unwrap().unwrap();
    let stored: Vec<JsonValue> = serde_json::from_str(&document).unwrap();
    assert_eq!(stored, vec![created]);
    assert_eq!(store.keys().await, vec!["counseling_records".to_string()]);
}

#[tokio::test]
async fn test_filesystem_reload_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(FilesystemStore::new(dir.path()));
    let mut dashboard = Dashboard::load(store.clone()).await;

    let created = dashboard
        .create(CollectionKind::Records, program(), &owner())
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    let att = ingest_file("opr.png", PNG, None, &IngestLimits::default()).unwrap();
    let added = dashboard
        .add_attachments(CollectionKind::Records, &id, "oprImages", vec![att], &owner())
        .await
        .unwrap();
    let target = InteractionTarget::Attachment {
        kind: CollectionKind::Records,
        record_id: id.clone(),
        slot: "oprImages".to_string(),
        attachment_id: added[0].id.clone(),
    };
    dashboard
        .add_comment(&target, "syabas", Some("guru besar"), &visitor())
        .await
        .unwrap();
    dashboard.update_kpi(KpiKind::Individual, 42.0, &owner()).await.unwrap();

    let reloaded = Dashboard::load(store).await;
    assert_eq!(
        reloaded.list(CollectionKind::Records, &visitor()).unwrap(),
        dashboard.list(CollectionKind::Records, &visitor()).unwrap()
    );
    assert_eq!(reloaded.profile(), dashboard.profile());
}

#[tokio::test]
async fn test_visitor_cannot_mutate_records() {
    let (store, mut dashboard) = memory_dashboard().await;
    let err = dashboard
        .create(CollectionKind::Records, program(), &visitor())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
    assert!(dashboard.collection(CollectionKind::Records).is_empty());
    assert!(store.keys().await.is_empty());

    let created = dashboard
        .create(CollectionKind::Records, program(), &owner())
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();
    assert!(dashboard
        .update(CollectionKind::Records, id, &json!({"tempat": "x"}), &visitor())
        .await
        .is_err());
    assert!(dashboard.delete(CollectionKind::Records, id, &visitor()).await.is_err());
    assert_eq!(
        dashboard.get(CollectionKind::Records, id, &visitor()).unwrap(),
        created
    );
}

#[tokio::test]
async fn test_required_fields_block_create() {
    let (store, mut dashboard) = memory_dashboard().await;
    let err = dashboard
        .create(CollectionKind::Meeting, json!({}), &owner())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(dashboard.collection(CollectionKind::Meeting).len(), 0);
    assert!(store.keys().await.is_empty());
}

#[tokio::test]
async fn test_sessions_need_access_code() {
    let (_store, mut dashboard) = memory_dashboard().await;
    dashboard
        .create(CollectionKind::Sessions, json!({"caption": "sesi kelompok"}), &owner())
        .await
        .unwrap();

    assert!(matches!(
        dashboard.list(CollectionKind::Sessions, &visitor()),
        Err(Error::Forbidden(_))
    ));
    let unlocked = SessionState {
        is_owner: false,
        sessions_unlocked: true,
    };
    let list = dashboard.list(CollectionKind::Sessions, &unlocked).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_feedback_thread_and_default_names() {
    let (_store, mut dashboard) = memory_dashboard().await;
    let created = dashboard
        .create(CollectionKind::Feedbacks, feedback(), &visitor())
        .await
        .unwrap();
    let target = InteractionTarget::Record {
        kind: CollectionKind::Feedbacks,
        record_id: created["id"].as_str().unwrap().to_string(),
    };

    let reply = dashboard
        .add_comment(&target, "terima kasih", None, &owner())
        .await
        .unwrap();
    assert_eq!(reply.user_name, "CIKGU LILY");
    let other = dashboard
        .add_comment(&target, "setuju", Some("  "), &visitor())
        .await
        .unwrap();
    assert_eq!(other.user_name, "PELAWAT");

    dashboard.add_reaction(&target, "💖", &visitor()).await.unwrap();
    dashboard.add_reaction(&target, "💖", &visitor()).await.unwrap();

    assert!(matches!(
        dashboard.delete_comment(&target, &other.id, &visitor()).await,
        Err(Error::Forbidden(_))
    ));
    assert!(dashboard.delete_comment(&target, &other.id, &owner()).await.unwrap());
    assert!(!dashboard.delete_comment(&target, &other.id, &owner()).await.unwrap());

    let stored = dashboard
        .get(CollectionKind::Feedbacks, target_id(&target), &visitor())
        .unwrap();
    assert_eq!(stored["comments"].as_array().unwrap().len(), 1);
    assert_eq!(stored["reactions"], json!([{"emoji": "💖", "count": 2}]));
}

fn target_id(target: &InteractionTarget) -> &str {
    match target {
        InteractionTarget::Record { record_id, .. } => record_id,
        InteractionTarget::Attachment { record_id, .. } => record_id,
        InteractionTarget::ProfileAttachment { attachment_id, .. } => attachment_id,
    }
}

#[tokio::test]
async fn test_delete_leaves_other_collections() {
    let (store, mut dashboard) = memory_dashboard().await;
    let program = dashboard
        .create(CollectionKind::Records, program(), &owner())
        .await
        .unwrap();
    dashboard
        .create(CollectionKind::Bilik, json!({"caption": "ruang menunggu"}), &owner())
        .await
        .unwrap();
    let bilik_before = store.get("counseling_bilik").await.unwrap();

    dashboard
        .delete(CollectionKind::Records, program["id"].as_str().unwrap(), &owner())
        .await
        .unwrap();
    assert!(dashboard.collection(CollectionKind::Records).is_empty());
    assert_eq!(dashboard.collection(CollectionKind::Bilik).len(), 1);
    assert_eq!(store.get("counseling_bilik").await.unwrap(), bilik_before);
}

#[tokio::test]
async fn test_failed_write_is_reported() {
    let mut dashboard = Dashboard::load(Arc::new(ReadOnlyStore)).await;
    let err = dashboard
        .create(CollectionKind::Records, program(), &owner())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
    // The in-memory state keeps the mutation.
    assert_eq!(dashboard.collection(CollectionKind::Records).len(), 1);
}

#[tokio::test]
async fn test_mirror_pushes_owner_records_and_all_feedback() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut dashboard = Dashboard::load(Arc::new(MemoryStore::new()))
        .await
        .with_mirror(Arc::new(RecordingMirror { tx }));

    dashboard
        .create(CollectionKind::Records, program(), &owner())
        .await
        .unwrap();
    let (module, data) = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(module, "records");
    assert_eq!(data.as_array().unwrap().len(), 1);

    dashboard
        .create(CollectionKind::Feedbacks, feedback(), &visitor())
        .await
        .unwrap();
    let (module, _) = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(module, "feedbacks");

    // A visitor comment on a program photo is saved locally but not mirrored.
    let id = dashboard.list(CollectionKind::Records, &visitor()).unwrap()[0]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let att = ingest_file("a.png", PNG, None, &IngestLimits::default()).unwrap();
    let added = dashboard
        .add_attachments(CollectionKind::Records, &id, "oprImages", vec![att], &owner())
        .await
        .unwrap();
    let _ = rx.recv().await;
    dashboard
        .add_reaction(
            &InteractionTarget::Attachment {
                kind: CollectionKind::Records,
                record_id: id,
                slot: "oprImages".to_string(),
                attachment_id: added[0].id.clone(),
            },
            "🔥",
            &visitor(),
        )
        .await
        .unwrap();
    assert!(tokio::time::timeout(Duration::from_millis(100), rx.recv())
        .await
        .is_err());

    // Unmirrored collections never push.
    dashboard
        .create(CollectionKind::Bilik, json!({"caption": "x"}), &owner())
        .await
        .unwrap();
    assert!(tokio::time::timeout(Duration::from_millis(100), rx.recv())
        .await
        .is_err());
}

#[tokio::test]
async fn test_apply_remote_replaces_and_writes_locally() {
    let (store, mut dashboard) = memory_dashboard().await;
    dashboard
        .create(CollectionKind::Feedbacks, feedback(), &visitor())
        .await
        .unwrap();

    let remote = vec![
        json!({"id": "r1", "name": "A", "comment": "B", "rating": 4, "timestamp": 1700000000000i64}),
        json!({"id": "r2", "name": "C", "comment": "D", "rating": 2, "timestamp": 1700000001000i64}),
    ];
    let revision = dashboard.revision(CollectionKind::Feedbacks);
    assert_eq!(revision, 1);
    let applied = dashboard
        .apply_remote(CollectionKind::Feedbacks, remote, revision)
        .await
        .unwrap();
    assert!(applied);
    assert_eq!(dashboard.collection(CollectionKind::Feedbacks).len(), 2);
    assert_eq!(dashboard.revision(CollectionKind::Feedbacks), revision);
    let document = store.get("visitor_feedbacks").await.unwrap().unwrap();
    assert!(document.contains("\"r2\""));

    let err = dashboard
        .apply_remote(CollectionKind::Feedbacks, vec![json!("garbage")], revision)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
    assert_eq!(dashboard.collection(CollectionKind::Feedbacks).len(), 2);
}

#[tokio::test]
async fn test_apply_remote_skips_after_local_write() {
    let (store, mut dashboard) = memory_dashboard().await;
    let before_fetch = dashboard.revision(CollectionKind::Feedbacks);
    dashboard
        .create(CollectionKind::Feedbacks, feedback(), &visitor())
        .await
        .unwrap();
    assert_eq!(dashboard.revision(CollectionKind::Records), 0);

    let applied = dashboard
        .apply_remote(CollectionKind::Feedbacks, Vec::new(), before_fetch)
        .await
        .unwrap();
    assert!(!applied);
    assert_eq!(dashboard.collection(CollectionKind::Feedbacks).len(), 1);
    let document = store.get("visitor_feedbacks").await.unwrap().unwrap();
    assert!(document.contains("BILIK KAUNSELING SELESA"));
}

#[tokio::test]
async fn test_mutations_complete_without_mirror() {
    let (store, mut dashboard) = memory_dashboard().await;
    assert!(!dashboard.has_mirror());

    let created = dashboard
        .create(CollectionKind::Records, program(), &owner())
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();
    dashboard
        .update(CollectionKind::Records, id, &json!({"tempat": "makmal"}), &owner())
        .await
        .unwrap();
    dashboard
        .create(CollectionKind::Feedbacks, feedback(), &visitor())
        .await
        .unwrap();

    let document = store.get("counseling_records").await.unwrap().unwrap();
    assert!(document.contains("MAKMAL"));
    assert!(store.get("visitor_feedbacks").await.unwrap().is_some());
}

#[tokio::test]
async fn test_profile_operations_and_stats() {
    let (_store, mut dashboard) = memory_dashboard().await;
    dashboard
        .update_profile(&json!({"quote": "Sentiasa bersedia"}), &owner())
        .await
        .unwrap();
    dashboard.set_emotion("😊", "gembira", &owner()).await.unwrap();
    dashboard.set_holland_image("S", "data:image/png;base64,AA", &owner()).await.unwrap();
    let att = ingest_file("jadual.png", PNG, None, &IngestLimits::default()).unwrap();
    let added = dashboard
        .add_profile_attachments(ProfileList::Jadual, vec![att], &owner())
        .await
        .unwrap();
    assert!(dashboard.update_kpi(KpiKind::Group, 3.0, &visitor()).await.is_err());
    dashboard.update_kpi(KpiKind::Group, 3.0, &owner()).await.unwrap();

    dashboard
        .add_comment(
            &InteractionTarget::ProfileAttachment {
                list: ProfileList::Jadual,
                attachment_id: added[0].id.clone(),
            },
            "jelas",
            None,
            &visitor(),
        )
        .await
        .unwrap();

    dashboard
        .create(
            CollectionKind::Bureaus,
            json!({"category": "KOKURIKULUM", "jawatankuasa": "kelab", "jawatan": "penasihat"}),
            &owner(),
        )
        .await
        .unwrap();
    dashboard
        .create(CollectionKind::Feedbacks, feedback(), &visitor())
        .await
        .unwrap();
    dashboard
        .create(
            CollectionKind::Feedbacks,
            json!({"name": "x", "comment": "y", "rating": 3}),
            &visitor(),
        )
        .await
        .unwrap();

    let profile = dashboard.profile();
    assert_eq!(profile.quote, "Sentiasa bersedia");
    assert_eq!(profile.current_emotion.as_ref().unwrap().label, "GEMBIRA");
    assert_eq!(profile.jadual_urls[0].comments[0].user_name, "PELAWAT");

    assert_eq!(dashboard.bureaus_by_category(SumbanganCategory::Kokurikulum).len(), 1);
    assert!(dashboard.bureaus_by_category(SumbanganCategory::Kurikulum).is_empty());

    let stats = dashboard.stats();
    assert_eq!(stats.total_records, 3);
    assert_eq!(stats.collections["feedbacks"], 2);
    assert_eq!(stats.total_attachments, 1);
    assert_eq!(stats.average_rating, Some(4.0));
    assert_eq!(stats.manual_kpi_group, Some(3.0));
}

#[tokio::test]
async fn test_duty_week_day_slots() {
    let (_store, mut dashboard) = memory_dashboard().await;
    let week = dashboard
        .create(
            CollectionKind::DutyWeekly,
            json!({"weekNumber": 7, "weekRange": "17/2 - 21/2"}),
            &owner(),
        )
        .await
        .unwrap();
    let id = week["id"].as_str().unwrap();
    let att = ingest_file("pagi.png", PNG, None, &IngestLimits::default()).unwrap();
    let added = dashboard
        .add_attachments(CollectionKind::DutyWeekly, id, "day:RABU", vec![att], &owner())
        .await
        .unwrap();
    let updated = dashboard
        .set_duty_details(
            CollectionKind::DutyWeekly,
            id,
            "day:RABU",
            &added[0].id,
            kaunseling_core::DutyDetails {
                date: "19/2".to_string(),
                time: "7:00".to_string(),
                location: "pagar".to_string(),
            },
            &owner(),
        )
        .await
        .unwrap();
    assert_eq!(updated.duty_details.unwrap().location, "PAGAR");

    let stored = dashboard.get(CollectionKind::DutyWeekly, id, &visitor()).unwrap();
    assert_eq!(stored["dayLogs"][0]["day"], "RABU");
    assert_eq!(stored["dayLogs"][0]["images"][0]["dutyDetails"]["time"], "7:00");
}

#[tokio::test]
async fn test_visitor_reaction_on_unknown_day_changes_nothing() {
    let (store, mut dashboard) = memory_dashboard().await;
    let week = dashboard
        .create(
            CollectionKind::DutyWeekly,
            json!({"weekNumber": 0, "weekRange": "minggu 1"}),
            &owner(),
        )
        .await
        .unwrap();
    let id = week["id"].as_str().unwrap().to_string();
    let before = store.get("counseling_duty_weekly").await.unwrap().unwrap();

    for day in ["day:JUNK1", "day:JUNK2"] {
        let target = InteractionTarget::Attachment {
            kind: CollectionKind::DutyWeekly,
            record_id: id.clone(),
            slot: day.to_string(),
            attachment_id: "nope".to_string(),
        };
        let err = dashboard.add_reaction(&target, "👍", &visitor()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    let stored = dashboard.get(CollectionKind::DutyWeekly, &id, &visitor()).unwrap();
    assert_eq!(stored["dayLogs"], json!([]));

    dashboard
        .update(CollectionKind::DutyWeekly, &id, &json!({"weekRange": "minggu 2"}), &owner())
        .await
        .unwrap();
    let after = store.get("counseling_duty_weekly").await.unwrap().unwrap();
    assert_ne!(after, before);
    assert!(!after.contains("JUNK"));
}
