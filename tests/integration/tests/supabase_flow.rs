//! Settings and trial logic against a mocked Supabase REST endpoint.

use axum::http::StatusCode;
use serde_json::{json, Value};
use shoplens_core::SecretString;
use shoplens_integration_tests::TestApp;
use shoplens_secrets::{CredentialCipher, MasterKey};
use shoplens_store::{
    CredentialKind, SettingsStore, SupabaseDatabase, TrialGate, UserSettings, WriteOutcome,
};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn supabase(server: &MockServer) -> Arc<SupabaseDatabase> {
    Arc::new(SupabaseDatabase::new(&server.uri(), SecretString::new("service-key")).unwrap())
}

fn store(db: Arc<SupabaseDatabase>, key: MasterKey) -> SettingsStore {
    SettingsStore::new(db.clone(), CredentialCipher::new(key), TrialGate::new(db, 30))
}

async fn mount_user(server: &MockServer, created_at: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", "eq.u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "u1", "created_at": created_at }
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_insert_sends_ciphertext_and_reads_back() {
    let server = MockServer::start().await;
    let key = MasterKey::generate();

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/user_settings"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let settings = store(supabase(&server), key.clone());
    let outcome = settings
        .write(UserSettings {
            user_id: "u1".into(),
            openai_key: Some("sk-live-123".into()),
            notion_database_id: Some("db-9".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Persisted);

    let requests = server.received_requests().await.unwrap();
    let insert = requests
        .iter()
        .find(|r| r.method.to_string() == "POST")
        .unwrap();
    let body: Value = serde_json::from_slice(&insert.body).unwrap();
    let sealed = body["openai_key"].as_str().unwrap().to_string();
    assert!(!sealed.contains("sk-live-123"));
    assert_eq!(body["notion_database_id"], "db-9");
    assert_eq!(body["user_id"], "u1");

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "user_id": "u1", "openai_key": sealed, "notion_database_id": "db-9" }
        ])))
        .mount(&server)
        .await;

    let resolved = settings
        .resolve_secret("u1", CredentialKind::OpenAiKey)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.expose_secret(), "sk-live-123");
}

#[tokio::test]
async fn test_backend_failure_degrades_write() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/user_settings"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let app = TestApp::new(supabase(&server), MasterKey::generate(), None);
    let (status, body) = app
        .post_json(
            "/api/user-settings",
            json!({ "user_id": "u1", "slack_webhook": "https://hooks.slack.com/x" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "success": true, "dev_mode": true }));
}

#[tokio::test]
async fn test_existing_row_is_patched() {
    let server = MockServer::start().await;
    let key = MasterKey::generate();
    let sealed = CredentialCipher::new(key.clone()).encrypt("old").unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "user_id": "u1", "notion_token": sealed }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/user_settings"))
        .and(query_param("user_id", "eq.u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = store(supabase(&server), key)
        .write(UserSettings {
            user_id: "u1".into(),
            notion_token: Some("new".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!outcome.is_degraded());
}

#[tokio::test]
async fn test_trial_read_from_users_table() {
    let server = MockServer::start().await;
    mount_user(&server, "2020-01-01T00:00:00+00:00").await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let app = TestApp::new(supabase(&server), MasterKey::generate(), Some("sk-operator"));
    let (status, body) = app.get_json("/api/user-settings/u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_trial_active"], false);
    assert_eq!(body["trial_days_left"], 0);

    let (status, _) = app.get_json("/api/get-api-key/u1/openai_key").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unreachable_store_maps_to_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_settings"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let app = TestApp::new(supabase(&server), MasterKey::generate(), None);
    let (status, body) = app.get_json("/api/get-api-key/u1/notion_token").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "store_unavailable");
}
