// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures: timestamps, items, and a throwaway SQLite store.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use harvest_config::model::StorageConfig;
use harvest_core::{HarvestError, MessageItem, MessageStore};
use harvest_storage::SqliteStore;

/// A fixed UTC instant `secs` seconds after 2024-01-01T00:00:00Z.
pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
        + Duration::seconds(secs)
}

/// An item whose timestamp grows with its id.
pub fn item(id: i64, text: &str) -> MessageItem {
    MessageItem::new(id, ts(id)).with_text(text)
}

/// A [`SqliteStore`] backed by a file in a temp directory, removed on drop.
pub struct TempStore {
    pub store: Arc<SqliteStore>,
    _dir: tempfile::TempDir,
}

impl TempStore {
    /// Create and initialize the store.
    pub async fn new() -> Result<Self, HarvestError> {
        let dir = tempfile::TempDir::new().map_err(|e| HarvestError::Storage { source: e.into() })?;
        let path = dir.path().join("harvest-test.db");
        let store = SqliteStore::new(StorageConfig {
            database_path: path.to_string_lossy().to_string(),
            wal_mode: true,
        });
        store.initialize().await?;
        Ok(Self {
            store: Arc::new(store),
            _dir: dir,
        })
    }
}
