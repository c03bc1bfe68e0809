// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`MessageStore`] trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use harvest_config::model::StorageConfig;
use harvest_core::{
    AdapterType, DomainCount, HarvestError, HealthStatus, Message, MessageStore, PluginAdapter,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed message store.
///
/// The database is opened lazily by [`MessageStore::initialize`]; every
/// other operation fails with a storage error until then.
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a store for the configured path without touching the disk.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, HarvestError> {
        self.db.get().ok_or_else(|| HarvestError::Storage {
            source: "store not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, HarvestError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HarvestError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("store shut down");
        }
        Ok(())
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn initialize(&self) -> Result<(), HarvestError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| HarvestError::Storage {
            source: "store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), HarvestError> {
        self.db()?.close().await
    }

    async fn upsert_message(&self, message: &Message) -> Result<(), HarvestError> {
        queries::messages::upsert_message(self.db()?, message).await
    }

    async fn find_latest(&self, channel_name: &str) -> Result<Option<Message>, HarvestError> {
        queries::messages::find_latest(self.db()?, channel_name).await
    }

    async fn max_source_id(&self, channel_name: &str) -> Result<Option<i64>, HarvestError> {
        queries::messages::max_source_id(self.db()?, channel_name).await
    }

    async fn get_message(
        &self,
        channel_name: &str,
        source_id: i64,
    ) -> Result<Option<Message>, HarvestError> {
        queries::messages::get_message(self.db()?, channel_name, source_id).await
    }

    async fn find_by_channel(
        &self,
        channel_name: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, HarvestError> {
        queries::messages::find_by_channel(self.db()?, channel_name, limit).await
    }

    async fn find_by_domain(
        &self,
        domain: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, HarvestError> {
        queries::messages::find_by_domain(self.db()?, domain, limit).await
    }

    async fn count_messages(&self, channel_name: &str) -> Result<u64, HarvestError> {
        queries::messages::count_messages(self.db()?, channel_name).await
    }

    async fn top_domains(&self, k: usize) -> Result<Vec<DomainCount>, HarvestError> {
        queries::domains::top_domains(self.db()?, k).await
    }

    async fn ensure_indexes(&self) -> Result<(), HarvestError> {
        queries::domains::ensure_indexes(self.db()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_store_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.version(), semver::Version::new(0, 1, 0));
        assert_eq!(store.adapter_type(), AdapterType::Store);
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));

        assert!(store.health_check().await.is_err());
        assert!(matches!(
            store.find_latest("news").await,
            Err(HarvestError::Storage { .. })
        ));
        assert!(!db_path.exists());
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));

        store.initialize().await.unwrap();
        assert!(store.initialize().await.is_err());
    }

    #[tokio::test]
    async fn full_lifecycle_through_trait_object() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let store: Box<dyn MessageStore> =
            Box::new(SqliteStore::new(make_config(db_path.to_str().unwrap())));
        store.initialize().await.unwrap();
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);

        let msg = Message {
            channel_name: "news".into(),
            source_id: 11,
            parent_id: None,
            text: Some("see https://docs.rs/tokio".into()),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            sender_id: None,
            chat_id: Some(-100),
            urls: vec!["https://docs.rs/tokio".into()],
            domains: vec!["docs.rs".into()],
        };
        store.upsert_message(&msg).await.unwrap();
        store.upsert_message(&msg).await.unwrap();
        store.ensure_indexes().await.unwrap();

        assert_eq!(store.count_messages("news").await.unwrap(), 1);
        assert_eq!(store.max_source_id("news").await.unwrap(), Some(11));
        assert_eq!(store.find_latest("news").await.unwrap(), Some(msg.clone()));
        assert_eq!(store.get_message("news", 11).await.unwrap(), Some(msg.clone()));
        assert_eq!(store.find_by_channel("news", None).await.unwrap(), vec![msg.clone()]);
        assert_eq!(store.find_by_domain("docs.rs", Some(5)).await.unwrap(), vec![msg]);
        assert_eq!(
            store.top_domains(10).await.unwrap(),
            vec![DomainCount::new("docs.rs", 1)]
        );

        store.close().await.unwrap();
        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("persist.db");
        let path = db_path.to_str().unwrap();

        {
            let store = SqliteStore::new(make_config(path));
            store.initialize().await.unwrap();
            let msg = Message {
                channel_name: "news".into(),
                source_id: 3,
                parent_id: None,
                text: None,
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                sender_id: None,
                chat_id: None,
                urls: Vec::new(),
                domains: Vec::new(),
            };
            store.upsert_message(&msg).await.unwrap();
            store.shutdown().await.unwrap();
        }

        let store = SqliteStore::new(make_config(path));
        store.initialize().await.unwrap();
        assert_eq!(store.count_messages("news").await.unwrap(), 1);
    }
}
