// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message store trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::HarvestError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{DomainCount, Message};

/// Keyed, idempotent message persistence.
///
/// Messages are unique per `(channel_name, source_id)`. Every operation is
/// atomic per key, so concurrent upserts of distinct keys need no client-side
/// locking.
#[async_trait]
pub trait MessageStore: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), HarvestError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), HarvestError>;

    /// Insert the message, or overwrite every field of the existing record
    /// with the same `(channel_name, source_id)`.
    async fn upsert_message(&self, message: &Message) -> Result<(), HarvestError>;

    /// Most recent message of a channel by timestamp.
    async fn find_latest(&self, channel_name: &str) -> Result<Option<Message>, HarvestError>;

    /// Largest stored `source_id` of a channel.
    async fn max_source_id(&self, channel_name: &str) -> Result<Option<i64>, HarvestError>;

    /// Fetch one message by key.
    async fn get_message(
        &self,
        channel_name: &str,
        source_id: i64,
    ) -> Result<Option<Message>, HarvestError>;

    /// Messages of a channel, newest first.
    async fn find_by_channel(
        &self,
        channel_name: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, HarvestError>;

    /// Messages mentioning `domain`, newest first.
    async fn find_by_domain(
        &self,
        domain: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, HarvestError>;

    /// Number of stored messages for a channel.
    async fn count_messages(&self, channel_name: &str) -> Result<u64, HarvestError>;

    /// Domain mention counts across all stored messages, count descending
    /// then domain ascending, truncated to `k` rows.
    async fn top_domains(&self, k: usize) -> Result<Vec<DomainCount>, HarvestError>;

    /// Declare (idempotently) the secondary indexes and refresh planner stats.
    async fn ensure_indexes(&self) -> Result<(), HarvestError>;
}
