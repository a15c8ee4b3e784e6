//! Shared fixtures for the cross-crate tests.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::Value;
use shoplens_core::config::ServerConfig;
use shoplens_core::SecretString;
use shoplens_gateway::advice::AdviceError;
use shoplens_gateway::notify::NotifyError;
use shoplens_gateway::report::RenderError;
use shoplens_gateway::{AdviceGenerator, AppState, Gateway, Notifier, PdfRenderer};
use shoplens_secrets::{CredentialCipher, MasterKey};
use shoplens_store::analysis::AnalysisResult;
use shoplens_store::{Database, HistoryStore, MemoryDatabase, SettingsStore, TrialGate};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Wraps the HTML in a fake PDF header so tests can read it back.
pub struct StubRenderer;

#[async_trait]
impl PdfRenderer for StubRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let mut pdf = b"%PDF-1.4\n".to_vec();
        pdf.extend_from_slice(html.as_bytes());
        Ok(pdf)
    }
}

/// Answers every request with the key it was given.
pub struct EchoKeyAdvisor;

#[async_trait]
impl AdviceGenerator for EchoKeyAdvisor {
    async fn generate(
        &self,
        api_key: &SecretString,
        _url: &str,
        _analysis: &AnalysisResult,
    ) -> Result<String, AdviceError> {
        Ok(format!("advice via {}", api_key.expose_secret()))
    }
}

/// Forwards every message to a channel.
pub struct ChannelNotifier(pub mpsc::UnboundedSender<String>);

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        let _ = self.0.send(text.to_string());
        Ok(())
    }
}

/// A router over `db` plus the receiving end of its notifications.
pub struct TestApp {
    pub router: Router,
    pub notifications: mpsc::UnboundedReceiver<String>,
}

impl TestApp {
    pub fn new(db: Arc<dyn Database>, key: MasterKey, fallback_key: Option<&str>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let settings = SettingsStore::new(
            db.clone(),
            CredentialCipher::new(key),
            TrialGate::new(db.clone(), 30),
        )
        .with_fallback_openai_key(fallback_key.map(SecretString::new));

        let state = AppState {
            db: db.clone(),
            settings,
            history: HistoryStore::new(db),
            advisor: Arc::new(EchoKeyAdvisor),
            notifier: Arc::new(ChannelNotifier(tx)),
            renderer: Arc::new(StubRenderer),
        };

        Self {
            router: Gateway::new(ServerConfig::default(), state).router(),
            notifications: rx,
        }
    }

    /// Send a request and collect the status and raw body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }
}

/// Insert an account created `days_ago` days before now.
pub async fn add_user(db: &MemoryDatabase, user_id: &str, days_ago: i64) {
    let created = (Utc::now() - Duration::days(days_ago)).to_rfc3339();
    db.put_user(user_id, &created).await;
}
