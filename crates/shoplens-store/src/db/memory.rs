//! In-process tables, used in dev mode and tests.

use super::Database;
use crate::model::{HistoryRecord, SettingsPatch, SettingsRow, UserRecord};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory database. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryDatabase {
    users: RwLock<HashMap<String, UserRecord>>,
    settings: RwLock<HashMap<String, SettingsRow>>,
    history: RwLock<Vec<HistoryRecord>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace an account row.
    pub async fn put_user(&self, user_id: &str, created_at: &str) {
        self.users.write().await.insert(
            user_id.to_string(),
            UserRecord {
                id: user_id.to_string(),
                created_at: Some(created_at.to_string()),
            },
        );
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn get_settings(&self, user_id: &str) -> Result<Option<SettingsRow>> {
        Ok(self.settings.read().await.get(user_id).cloned())
    }

    async fn insert_settings(&self, row: SettingsRow) -> Result<()> {
        self.settings.write().await.insert(row.user_id.clone(), row);
        Ok(())
    }

    async fn update_settings(&self, user_id: &str, patch: &SettingsPatch) -> Result<()> {
        // Matches the hosted store: updating a missing row is a no-op.
        if let Some(row) = self.settings.write().await.get_mut(user_id) {
            row.apply(patch);
        }
        Ok(())
    }

    async fn insert_history(&self, record: HistoryRecord) -> Result<()> {
        self.history.write().await.push(record);
        Ok(())
    }

    async fn list_history(&self, user_email: &str, tags: &[String]) -> Result<Vec<HistoryRecord>> {
        let history = self.history.read().await;

        let mut rows: Vec<HistoryRecord> = history
            .iter()
            .rev()
            .filter(|r| r.user_email == user_email)
            .filter(|r| tags.iter().all(|t| r.item.tags.contains(t)))
            .cloned()
            .collect();

        // Stable sort keeps later inserts first on equal timestamps.
        rows.sort_by(|a, b| b.item.analyzed_at.cmp(&a.item.analyzed_at));
        Ok(rows)
    }
}
