//! Saving, listing, and reporting on analyses through the HTTP surface.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use shoplens_gateway::ADVICE_UNAVAILABLE;
use shoplens_integration_tests::{add_user, TestApp};
use shoplens_secrets::MasterKey;
use shoplens_store::MemoryDatabase;
use std::sync::Arc;
use std::time::Duration;

fn analysis(products: usize) -> Value {
    json!({
        "product_names": vec!["item"; products],
        "prices": ["¥1,000", "¥2,000"],
        "category_links": ["/collections/all"],
        "advice": "",
        "competitor_summary": {
            "product_count": products,
            "category_count": 1,
            "page_type": "collection",
            "features": { "search": true }
        }
    })
}

async fn save(app: &TestApp, url: &str, email: &str, result: Value) -> (StatusCode, Value) {
    let (status, body) = app
        .post_json(
            "/api/save-history",
            json!({ "url": url, "analysis_result": result, "user_email": email }),
        )
        .await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_save_list_and_notify() {
    let mut app = TestApp::new(Arc::new(MemoryDatabase::new()), MasterKey::generate(), None);

    let (status, body) = save(&app, "https://shop.example.com/", "a@example.com", analysis(3)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    let id = body["id"].as_str().unwrap().to_string();

    let message = tokio::time::timeout(Duration::from_secs(5), app.notifications.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(message.contains("https://shop.example.com/"));
    assert!(message.contains("商品数: 3"));

    let (status, body) = app.get_json("/api/history?user_email=a@example.com").await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], id);
    assert_eq!(items[0]["product_count"], 3);
    assert_eq!(items[0]["price_count"], 2);
    assert_eq!(items[0]["has_advice"], false);
    assert!(items[0]["diagnostic_scores"].is_object());

    let tags: Vec<&str> = items[0]["tags"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(tags.contains(&"EC分析"));
    assert!(tags.contains(&"検索機能"));
}

#[tokio::test]
async fn test_history_is_scoped_and_filtered() {
    let app = TestApp::new(Arc::new(MemoryDatabase::new()), MasterKey::generate(), None);

    save(&app, "https://one.example.com", "a@example.com", analysis(2)).await;
    save(&app, "https://two.example.com", "a@example.com", analysis(0)).await;
    save(&app, "https://three.example.com", "b@example.com", analysis(5)).await;

    let (_, body) = app.get_json("/api/history?user_email=a@example.com").await;
    let urls: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|i| i["url"].as_str())
        .collect();
    assert_eq!(urls.len(), 2);
    assert!(!urls.contains(&"https://three.example.com"));

    let (_, body) = app
        .get_json("/api/history?user_email=a@example.com&tags=%E5%95%86%E5%93%81%E3%81%82%E3%82%8A")
        .await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["url"], "https://one.example.com");
}

#[tokio::test]
async fn test_history_validation() {
    let app = TestApp::new(Arc::new(MemoryDatabase::new()), MasterKey::generate(), None);

    let (status, body) = app.get_json("/api/history").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");

    let (status, _) = app
        .post_json(
            "/api/save-history",
            json!({ "url": "https://shop.example.com", "analysis_result": {} }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json("/api/save-history", json!({ "url": 42 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pdf_uses_trial_key_for_advice() {
    let db = Arc::new(MemoryDatabase::new());
    add_user(&db, "u1", 2).await;
    let app = TestApp::new(db, MasterKey::generate(), Some("sk-operator"));

    let mut request = analysis(1);
    request["url"] = json!("https://shop.example.com");
    request["user_id"] = json!("u1");

    let http = Request::builder()
        .method("POST")
        .uri("/api/generate-pdf")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(request.to_string()))
        .unwrap();
    let (status, pdf) = app.send(http).await;
    assert_eq!(status, StatusCode::OK);
    assert!(pdf.starts_with(b"%PDF"));

    let html = String::from_utf8_lossy(&pdf);
    assert!(html.contains("advice via sk-operator"));
    assert!(html.contains("shop.example.com"));
}

#[tokio::test]
async fn test_pdf_without_user_gets_placeholder() {
    let app = TestApp::new(Arc::new(MemoryDatabase::new()), MasterKey::generate(), None);

    let mut request = analysis(1);
    request["url"] = json!("https://shop.example.com");

    let http = Request::builder()
        .method("POST")
        .uri("/api/generate-pdf")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(request.to_string()))
        .unwrap();
    let (status, pdf) = app.send(http).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&pdf).contains(ADVICE_UNAVAILABLE));
}
