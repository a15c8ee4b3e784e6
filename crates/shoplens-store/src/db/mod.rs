//! Backing store abstraction.
//!
//! The service only needs a handful of table operations, so the trait
//! speaks in those terms instead of exposing a query builder.

mod memory;
mod supabase;

pub use memory::MemoryDatabase;
pub use supabase::SupabaseDatabase;

use crate::error::StoreError;
use crate::model::{HistoryRecord, SettingsPatch, SettingsRow, UserRecord};
use crate::Result;
use async_trait::async_trait;
use shoplens_core::config::{DatabaseBackend, DatabaseConfig};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Operations on the `users`, `user_settings` and `analysis_history` tables.
#[async_trait]
pub trait Database: Send + Sync {
    /// Short backend label for logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Cheap reachability check.
    async fn ping(&self) -> Result<()>;

    /// Look up an account by id.
    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>>;

    /// Fetch the settings row for a user, if any.
    async fn get_settings(&self, user_id: &str) -> Result<Option<SettingsRow>>;

    /// Insert a new settings row.
    async fn insert_settings(&self, row: SettingsRow) -> Result<()>;

    /// Apply a partial update to an existing settings row.
    async fn update_settings(&self, user_id: &str, patch: &SettingsPatch) -> Result<()>;

    /// Append a history row.
    async fn insert_history(&self, record: HistoryRecord) -> Result<()>;

    /// All history rows for an owner whose tags contain every tag in
    /// `tags`, newest first.
    async fn list_history(&self, user_email: &str, tags: &[String]) -> Result<Vec<HistoryRecord>>;
}

/// Bounds every call on the inner database by a fixed timeout.
///
/// A call that runs out of time yields [`StoreError::Timeout`], which the
/// stores treat like any other store failure.
pub struct TimeoutDatabase {
    inner: Arc<dyn Database>,
    limit: Duration,
}

impl TimeoutDatabase {
    pub fn new(inner: Arc<dyn Database>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        tokio::time::timeout(self.limit, fut)
            .await
            .map_err(|_| StoreError::Timeout(self.limit.as_secs()))?
    }
}

#[async_trait]
impl Database for TimeoutDatabase {
    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    async fn ping(&self) -> Result<()> {
        self.bounded(self.inner.ping()).await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>> {
        self.bounded(self.inner.get_user(user_id)).await
    }

    async fn get_settings(&self, user_id: &str) -> Result<Option<SettingsRow>> {
        self.bounded(self.inner.get_settings(user_id)).await
    }

    async fn insert_settings(&self, row: SettingsRow) -> Result<()> {
        self.bounded(self.inner.insert_settings(row)).await
    }

    async fn update_settings(&self, user_id: &str, patch: &SettingsPatch) -> Result<()> {
        self.bounded(self.inner.update_settings(user_id, patch)).await
    }

    async fn insert_history(&self, record: HistoryRecord) -> Result<()> {
        self.bounded(self.inner.insert_history(record)).await
    }

    async fn list_history(&self, user_email: &str, tags: &[String]) -> Result<Vec<HistoryRecord>> {
        self.bounded(self.inner.list_history(user_email, tags)).await
    }
}

/// Build the configured backend, wrapped in the configured timeout.
pub fn connect(config: &DatabaseConfig) -> Result<Arc<dyn Database>> {
    let inner: Arc<dyn Database> = match config.backend {
        DatabaseBackend::Memory => Arc::new(MemoryDatabase::new()),
        DatabaseBackend::Supabase => {
            let url = config
                .supabase_url
                .as_deref()
                .ok_or_else(|| StoreError::Config("supabase_url is not set".to_string()))?;
            let key = config
                .service_role_key
                .clone()
                .ok_or_else(|| StoreError::Config("service_role_key is not set".to_string()))?;
            Arc::new(SupabaseDatabase::new(url, key)?)
        }
    };

    Ok(Arc::new(TimeoutDatabase::new(
        inner,
        Duration::from_secs(config.timeout_secs),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A database whose every call hangs.
    struct StalledDatabase;

    #[async_trait]
    impl Database for StalledDatabase {
        fn backend_name(&self) -> &'static str {
            "stalled"
        }

        async fn ping(&self) -> Result<()> {
            std::future::pending().await
        }

        async fn get_user(&self, _user_id: &str) -> Result<Option<UserRecord>> {
            std::future::pending().await
        }

        async fn get_settings(&self, _user_id: &str) -> Result<Option<SettingsRow>> {
            std::future::pending().await
        }

        async fn insert_settings(&self, _row: SettingsRow) -> Result<()> {
            std::future::pending().await
        }

        async fn update_settings(&self, _user_id: &str, _patch: &SettingsPatch) -> Result<()> {
            std::future::pending().await
        }

        async fn insert_history(&self, _record: HistoryRecord) -> Result<()> {
            std::future::pending().await
        }

        async fn list_history(&self, _email: &str, _tags: &[String]) -> Result<Vec<HistoryRecord>> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_database_bounds_calls() {
        let db = TimeoutDatabase::new(Arc::new(StalledDatabase), Duration::from_secs(3));
        let result = db.get_settings("u1").await;
        assert!(matches!(result, Err(StoreError::Timeout(3))));
        assert_eq!(db.backend_name(), "stalled");
    }

    #[tokio::test]
    async fn test_timeout_database_passes_results_through() {
        let memory = Arc::new(MemoryDatabase::new());
        memory.put_user("u1", "2024-01-01T00:00:00Z").await;
        let db = TimeoutDatabase::new(memory, Duration::from_secs(1));
        let user = db.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_connect_supabase_requires_url() {
        let config = DatabaseConfig {
            backend: DatabaseBackend::Supabase,
            ..Default::default()
        };
        assert!(matches!(connect(&config), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_connect_memory() {
        let db = connect(&DatabaseConfig::default()).unwrap();
        assert_eq!(db.backend_name(), "memory");
    }
}
