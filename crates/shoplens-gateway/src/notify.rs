//! Operator notifications.

use async_trait::async_trait;
use reqwest::Client;
use shoplens_core::SecretString;
use shoplens_store::AnalysisHistoryItem;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook returned {0}")]
    Status(u16),
}

/// Sink for short human-readable messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> std::result::Result<(), NotifyError>;
}

/// Drops every message. Used when no webhook is configured.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _text: &str) -> std::result::Result<(), NotifyError> {
        Ok(())
    }
}

/// Posts to a Slack incoming webhook.
pub struct SlackNotifier {
    client: Client,
    webhook: SecretString,
}

impl SlackNotifier {
    pub fn new(webhook: SecretString) -> std::result::Result<Self, NotifyError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { client, webhook })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, text: &str) -> std::result::Result<(), NotifyError> {
        let response = self
            .client
            .post(self.webhook.expose_secret())
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        debug!("slack notification sent");
        Ok(())
    }
}

/// Message announcing a saved analysis.
pub fn saved_analysis_message(item: &AnalysisHistoryItem) -> String {
    let mut text = format!(
        "新しい分析が保存されました: {}\n商品数: {} / カテゴリー数: {} / 価格数: {}",
        item.url, item.product_count, item.category_count, item.price_count
    );
    if !item.tags.is_empty() {
        text.push_str(&format!("\nタグ: {}", item.tags.join(", ")));
    }
    text
}
