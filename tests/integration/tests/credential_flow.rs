//! Credential storage across restarts and key changes, driven over HTTP.

use axum::http::StatusCode;
use serde_json::{json, Value};
use shoplens_integration_tests::{add_user, TestApp};
use shoplens_secrets::MasterKey;
use shoplens_store::{Database, MemoryDatabase};
use std::sync::Arc;

fn parse(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

async fn save_openai_key(app: &TestApp, user_id: &str, key: &str) {
    let (status, body) = app
        .post_json(
            "/api/user-settings",
            json!({ "user_id": user_id, "openai_key": key }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!({ "success": true }));
}

#[tokio::test]
async fn test_secrets_survive_restart_with_same_key() {
    let db = Arc::new(MemoryDatabase::new());
    add_user(&db, "u1", 40).await;
    let key = MasterKey::generate();

    let first = TestApp::new(db.clone(), key.clone(), None);
    save_openai_key(&first, "u1", "sk-personal").await;
    drop(first);

    let second = TestApp::new(db.clone(), key, None);
    let (status, body) = second.get_json("/api/get-api-key/u1/openai_key").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["key"], "sk-personal");

    let stored = db.get_settings("u1").await.unwrap().unwrap();
    let cipher = stored.openai_key.unwrap();
    assert!(!cipher.contains("sk-personal"));
}

#[tokio::test]
async fn test_rotated_key_falls_back_to_trial_key() {
    let db = Arc::new(MemoryDatabase::new());
    add_user(&db, "u1", 3).await;

    let before = TestApp::new(db.clone(), MasterKey::generate(), Some("sk-operator"));
    save_openai_key(&before, "u1", "sk-personal").await;

    let after = TestApp::new(db.clone(), MasterKey::generate(), Some("sk-operator"));
    let (status, body) = after.get_json("/api/get-api-key/u1/openai_key").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["key"], "sk-operator");

    // The row still exists, so it still reads as set.
    let (_, settings) = after.get_json("/api/user-settings/u1").await;
    assert_eq!(settings["openai_key"], "API_KEY_SET");
}

#[tokio::test]
async fn test_expired_trial_without_personal_key() {
    let db = Arc::new(MemoryDatabase::new());
    add_user(&db, "u1", 45).await;
    let app = TestApp::new(db, MasterKey::generate(), Some("sk-operator"));

    let (status, body) = app.get_json("/api/get-api-key/u1/openai_key").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (_, settings) = app.get_json("/api/user-settings/u1").await;
    assert_eq!(settings["is_trial_active"], false);
    assert_eq!(settings["trial_days_left"], 0);
    assert_eq!(settings["openai_key"], "");
}

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let db = Arc::new(MemoryDatabase::new());
    add_user(&db, "u1", 1).await;
    let app = TestApp::new(db, MasterKey::generate(), None);

    let (status, _) = app
        .post_json(
            "/api/user-settings",
            json!({
                "user_id": "u1",
                "notion_token": "secret_abc",
                "notion_database_id": "db-123"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post_json(
            "/api/user-settings",
            json!({ "user_id": "u1", "slack_webhook": "https://hooks.slack.com/T/B/x", "notion_token": "" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, settings) = app.get_json("/api/user-settings/u1").await;
    assert_eq!(settings["notion_token"], "API_KEY_SET");
    assert_eq!(settings["notion_database_id"], "db-123");
    assert_eq!(settings["slack_webhook"], "API_KEY_SET");
    assert_eq!(settings["openai_key"], "");

    let (_, token) = app.get_json("/api/get-api-key/u1/notion_token").await;
    assert_eq!(token["key"], "secret_abc");
}

#[tokio::test]
async fn test_rejects_bad_requests() {
    let app = TestApp::new(Arc::new(MemoryDatabase::new()), MasterKey::generate(), None);

    let (status, body) = app
        .post_json("/api/user-settings", json!({ "user_id": "  " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body)["code"], "invalid_request");

    let (status, _) = app.get_json("/api/get-api-key/u1/password").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
