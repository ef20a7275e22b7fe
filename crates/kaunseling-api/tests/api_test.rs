//! End-to-end tests of the HTTP surface against an in-memory store.

use std::sync::Arc;

use kaunseling_api::{app, AppState, ServerConfig};
use kaunseling_core::defaults::SESSION_HEADER;
use kaunseling_store::{Dashboard, FilesystemStore, MemoryStore};
use reqwest::{multipart, Client, StatusCode};
use serde_json::{json, Value as JsonValue};

const PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

async fn spawn_server_with(dashboard: Dashboard) -> String {
    let config = ServerConfig::default();
    let state = AppState::new(dashboard, config.gate(), config.ingest_limits());
    let router = app(state, &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    format!("http://{}", addr)
}

async fn spawn_server() -> String {
    spawn_server_with(Dashboard::load(Arc::new(MemoryStore::new())).await).await
}

async fn login(client: &Client, base: &str) -> String {
    let res = client
        .post(format!("{base}/api/session/login"))
        .json(&json!({"password": "lily2016"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["isOwner"], true);
    body["token"].as_str().unwrap().to_string()
}

fn program() -> JsonValue {
    json!({
        "focusArea": "Psikososial dan kesejahteraan mental murid",
        "namaProgram": "minggu kesihatan mental",
        "tarikhMula": "2026-04-06",
        "tarikhTamat": "2026-04-10",
        "tempat": "dewan",
        "sasaran": "semua murid",
        "penyelaras": "cikgu lily",
        "sumbangan": ""
    })
}

async fn create_program(client: &Client, base: &str, token: &str) -> String {
    let res = client
        .post(format!("{base}/api/collections/records"))
        .header(SESSION_HEADER, token)
        .json(&program())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: JsonValue = res.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let base = spawn_server().await;
    let body: JsonValue = reqwest::get(format!("{base}/health")).await.unwrap().json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["remoteMirror"], false);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let base = spawn_server().await;
    let res = Client::new()
        .post(format!("{base}/api/session/login"))
        .json(&json!({"password": "LILY2016"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: JsonValue = res.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_second_session_reads_but_cannot_mutate() {
    let base = spawn_server().await;
    let client = Client::new();
    let token = login(&client, &base).await;
    let id = create_program(&client, &base, &token).await;

    // Another client without the flag sees the same record.
    let list: JsonValue = client
        .get(format!("{base}/api/collections/records"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["namaProgram"], "MINGGU KESIHATAN MENTAL");

    let res = client
        .patch(format!("{base}/api/collections/records/{id}"))
        .json(&json!({"tempat": "kantin"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(format!("{base}/api/collections/records/{id}"))
        .header(SESSION_HEADER, "not-a-session")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(format!("{base}/api/collections/records"))
        .json(&program())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_owner_update_and_delete() {
    let base = spawn_server().await;
    let client = Client::new();
    let token = login(&client, &base).await;
    let id = create_program(&client, &base, &token).await;

    let updated: JsonValue = client
        .patch(format!("{base}/api/collections/records/{id}"))
        .header(SESSION_HEADER, &token)
        .json(&json!({"tempat": "kantin", "id": "hijack"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["tempat"], "KANTIN");
    assert_eq!(updated["id"], id);

    let res = client
        .delete(format!("{base}/api/collections/records/{id}"))
        .header(SESSION_HEADER, &token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{base}/api/collections/records/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_kind_and_missing_fields() {
    let base = spawn_server().await;
    let client = Client::new();
    let token = login(&client, &base).await;

    let res = client
        .get(format!("{base}/api/collections/nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let mut incomplete = program();
    incomplete["namaProgram"] = json!("  ");
    let res = client
        .post(format!("{base}/api/collections/records"))
        .header(SESSION_HEADER, &token)
        .json(&incomplete)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let list: JsonValue = client
        .get(format!("{base}/api/collections/records"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_session_registry_requires_code() {
    let base = spawn_server().await;
    let client = Client::new();

    let res = client
        .get(format!("{base}/api/collections/sessions"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(format!("{base}/api/session/unlock"))
        .json(&json!({"code": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body: JsonValue = client
        .post(format!("{base}/api/session/unlock"))
        .json(&json!({"code": "lily_sessions"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["sessionsUnlocked"], true);
    assert_eq!(body["isOwner"], false);
    let token = body["token"].as_str().unwrap().to_string();

    let res = client
        .get(format!("{base}/api/collections/sessions"))
        .header(SESSION_HEADER, &token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let current: JsonValue = client
        .get(format!("{base}/api/session"))
        .header(SESSION_HEADER, &token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["sessionsUnlocked"], true);

    client
        .post(format!("{base}/api/session/logout"))
        .header(SESSION_HEADER, &token)
        .send()
        .await
        .unwrap();
    let res = client
        .get(format!("{base}/api/collections/sessions"))
        .header(SESSION_HEADER, &token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_guestbook_thread() {
    let base = spawn_server().await;
    let client = Client::new();

    let res = client
        .post(format!("{base}/api/collections/feedbacks"))
        .json(&json!({"name": "ibu ali", "comment": "bilik selesa", "rating": 5}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let feedback: JsonValue = res.json().await.unwrap();
    let id = feedback["id"].as_str().unwrap();

    let res = client
        .post(format!("{base}/api/collections/feedbacks/{id}/comments"))
        .json(&json!({"text": "terima kasih"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let comment: JsonValue = res.json().await.unwrap();
    assert_eq!(comment["userName"], "PELAWAT");
    let comment_id = comment["id"].as_str().unwrap();

    let res = client
        .delete(format!("{base}/api/collections/feedbacks/{id}/comments/{comment_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let token = login(&client, &base).await;
    let body: JsonValue = client
        .delete(format!("{base}/api/collections/feedbacks/{id}/comments/{comment_id}"))
        .header(SESSION_HEADER, &token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["removed"], true);

    let reaction: JsonValue = client
        .post(format!("{base}/api/collections/feedbacks/{id}/reactions"))
        .json(&json!({"emoji": "👍"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reaction["count"], 1);

    let res = client
        .post(format!("{base}/api/collections/feedbacks"))
        .json(&json!({"name": "x", "comment": "y", "rating": 9}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_attachment_upload_download_and_interactions() {
    let base = spawn_server().await;
    let client = Client::new();
    let token = login(&client, &base).await;
    let id = create_program(&client, &base, &token).await;

    let form = multipart::Form::new()
        .part(
            "files",
            multipart::Part::bytes(PNG.to_vec())
                .file_name("poster.png")
                .mime_str("image/png")
                .unwrap(),
        )
        .part(
            "files",
            multipart::Part::bytes(b"#!/bin/sh".to_vec())
                .file_name("run.sh")
                .mime_str("text/x-shellscript")
                .unwrap(),
        );
    let res = client
        .post(format!("{base}/api/collections/records/{id}/attachments/oprImages"))
        .header(SESSION_HEADER, &token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["attachments"].as_array().unwrap().len(), 1);
    assert_eq!(body["skipped"].as_array().unwrap().len(), 1);
    assert_eq!(body["attachments"][0]["name"], "POSTER.PNG");
    let attachment_id = body["attachments"][0]["id"].as_str().unwrap().to_string();
    let prefix = format!("{base}/api/collections/records/{id}/attachments/oprImages/{attachment_id}");

    let res = client.get(format!("{prefix}/content")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(res.bytes().await.unwrap().as_ref(), PNG);

    // Visitors may comment and react.
    let res = client
        .post(format!("{prefix}/comments"))
        .json(&json!({"text": "cantik", "userName": "ibu ali"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    for expected in 1..=2 {
        let reaction: JsonValue = client
            .post(format!("{prefix}/reactions"))
            .json(&json!({"emoji": "❤️"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(reaction["count"], expected);
    }

    let record: JsonValue = client
        .get(format!("{base}/api/collections/records/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let attachment = &record["oprImages"][0];
    assert_eq!(attachment["comments"][0]["userName"], "IBU ALI");
    assert_eq!(attachment["reactions"].as_array().unwrap().len(), 1);

    let stats: JsonValue = client
        .get(format!("{base}/api/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["totalAttachments"], 1);
    assert_eq!(stats["totalComments"], 1);

    let res = client
        .delete(&prefix)
        .header(SESSION_HEADER, &token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = client.get(format!("{prefix}/content")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_external_attachment_urls() {
    let base = spawn_server().await;
    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let token = login(&client, &base).await;

    let res = client
        .post(format!("{base}/api/collections/sessions"))
        .header(SESSION_HEADER, &token)
        .json(&json!({
            "caption": "sesi kelompok",
            "images": [
                {"id": "bad", "url": "https://x/\nbad"},
                {"id": "ext", "url": "https://cdn.example/foto.jpg"}
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let id = res.json::<JsonValue>().await.unwrap()["id"].as_str().unwrap().to_string();
    let prefix = format!("{base}/api/collections/sessions/{id}/attachments/images");

    let res = client
        .get(format!("{prefix}/bad/content"))
        .header(SESSION_HEADER, &token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("bad"));

    let res = client
        .get(format!("{prefix}/ext/content"))
        .header(SESSION_HEADER, &token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.headers()["location"], "https://cdn.example/foto.jpg");

    // The server keeps serving after the rejected URL.
    let res = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_generic_upload_type_is_sniffed() {
    let base = spawn_server().await;
    let client = Client::new();
    let token = login(&client, &base).await;
    let id = create_program(&client, &base, &token).await;

    let form = multipart::Form::new().part(
        "files",
        multipart::Part::bytes(PNG.to_vec())
            .file_name("poster")
            .mime_str("application/octet-stream")
            .unwrap(),
    );
    let res = client
        .post(format!("{base}/api/collections/records/{id}/attachments/oprImages"))
        .header(SESSION_HEADER, &token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["attachments"][0]["mimeType"], "image/png");
    assert!(body["skipped"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_profile_operations() {
    let base = spawn_server().await;
    let client = Client::new();

    let profile: JsonValue = client
        .get(format!("{base}/api/profile"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["name"], "CIKGU LILY");

    let res = client
        .put(format!("{base}/api/profile/emotion"))
        .json(&json!({"emoji": "😊", "label": "happy"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let token = login(&client, &base).await;
    let res = client
        .put(format!("{base}/api/profile/emotion"))
        .header(SESSION_HEADER, &token)
        .json(&json!({"emoji": "😊", "label": "happy"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let profile: JsonValue = client
        .put(format!("{base}/api/profile/kpi"))
        .header(SESSION_HEADER, &token)
        .json(&json!({"kind": "group", "value": 87.5}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["manualKpiGroup"], 87.5);

    let form = multipart::Form::new().part(
        "file",
        multipart::Part::bytes(PNG.to_vec())
            .file_name("jadual.png")
            .mime_str("image/png")
            .unwrap(),
    );
    let res = client
        .post(format!("{base}/api/profile/jadual"))
        .header(SESSION_HEADER, &token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let list: JsonValue = client
        .get(format!("{base}/api/profile/jadualUrls"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_records_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let client = Client::new();

    let base = spawn_server_with(Dashboard::load(Arc::new(FilesystemStore::new(dir.path()))).await).await;
    let token = login(&client, &base).await;
    let id = create_program(&client, &base, &token).await;

    let base = spawn_server_with(Dashboard::load(Arc::new(FilesystemStore::new(dir.path()))).await).await;
    let res = client
        .get(format!("{base}/api/collections/records/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
