// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory message store for deterministic testing.
//!
//! `MockStore` mirrors the keyed upsert and aggregation semantics of the
//! SQLite store and lets tests make individual operations fail.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use harvest_core::{
    AdapterType, DomainCount, HarvestError, HealthStatus, Message, MessageStore, PluginAdapter,
};

#[derive(Default)]
struct State {
    messages: HashMap<(String, i64), Message>,
    failing_upserts: HashSet<i64>,
    fail_find_latest: bool,
    fail_ensure_indexes: bool,
    upsert_calls: usize,
    ensure_index_calls: usize,
}

/// A mock store keyed by `(channel_name, source_id)`.
#[derive(Default, Clone)]
pub struct MockStore {
    state: Arc<Mutex<State>>,
}

fn injected(what: &str) -> HarvestError {
    HarvestError::Storage {
        source: format!("injected {what} failure").into(),
    }
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upsert of a message with this source id fail.
    pub async fn fail_upsert_of(&self, source_id: i64) {
        self.state.lock().await.failing_upserts.insert(source_id);
    }

    /// Make `find_latest` (and `max_source_id`) fail.
    pub async fn fail_find_latest(&self, fail: bool) {
        self.state.lock().await.fail_find_latest = fail;
    }

    pub async fn fail_ensure_indexes(&self, fail: bool) {
        self.state.lock().await.fail_ensure_indexes = fail;
    }

    /// Seed a message directly, bypassing fault injection.
    pub async fn seed(&self, message: Message) {
        let key = (message.channel_name.clone(), message.source_id);
        self.state.lock().await.messages.insert(key, message);
    }

    /// Total number of stored messages across channels.
    pub async fn len(&self) -> usize {
        self.state.lock().await.messages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of upsert attempts, failed ones included.
    pub async fn upsert_calls(&self) -> usize {
        self.state.lock().await.upsert_calls
    }

    pub async fn ensure_index_calls(&self) -> usize {
        self.state.lock().await.ensure_index_calls
    }

    /// Stored source ids of a channel, ascending.
    pub async fn ids(&self, channel_name: &str) -> Vec<i64> {
        let state = self.state.lock().await;
        let mut ids: Vec<i64> = state
            .messages
            .keys()
            .filter(|(c, _)| c == channel_name)
            .map(|(_, id)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

fn newest_first(mut messages: Vec<Message>, limit: Option<usize>) -> Vec<Message> {
    messages.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.source_id.cmp(&a.source_id))
    });
    if let Some(limit) = limit {
        messages.truncate(limit);
    }
    messages
}

#[async_trait]
impl PluginAdapter for MockStore {
    fn name(&self) -> &str {
        "mock-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, HarvestError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HarvestError> {
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MockStore {
    async fn initialize(&self) -> Result<(), HarvestError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), HarvestError> {
        Ok(())
    }

    async fn upsert_message(&self, message: &Message) -> Result<(), HarvestError> {
        let mut state = self.state.lock().await;
        state.upsert_calls += 1;
        if state.failing_upserts.contains(&message.source_id) {
            return Err(injected("upsert"));
        }
        let key = (message.channel_name.clone(), message.source_id);
        state.messages.insert(key, message.clone());
        Ok(())
    }

    async fn find_latest(&self, channel_name: &str) -> Result<Option<Message>, HarvestError> {
        let state = self.state.lock().await;
        if state.fail_find_latest {
            return Err(injected("find_latest"));
        }
        let of_channel = state
            .messages
            .values()
            .filter(|m| m.channel_name == channel_name)
            .cloned()
            .collect();
        Ok(newest_first(of_channel, Some(1)).into_iter().next())
    }

    async fn max_source_id(&self, channel_name: &str) -> Result<Option<i64>, HarvestError> {
        let state = self.state.lock().await;
        if state.fail_find_latest {
            return Err(injected("max_source_id"));
        }
        Ok(state
            .messages
            .keys()
            .filter(|(c, _)| c == channel_name)
            .map(|(_, id)| *id)
            .max())
    }

    async fn get_message(
        &self,
        channel_name: &str,
        source_id: i64,
    ) -> Result<Option<Message>, HarvestError> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .get(&(channel_name.to_string(), source_id))
            .cloned())
    }

    async fn find_by_channel(
        &self,
        channel_name: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, HarvestError> {
        let state = self.state.lock().await;
        let of_channel = state
            .messages
            .values()
            .filter(|m| m.channel_name == channel_name)
            .cloned()
            .collect();
        Ok(newest_first(of_channel, limit))
    }

    async fn find_by_domain(
        &self,
        domain: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, HarvestError> {
        let state = self.state.lock().await;
        let hits = state
            .messages
            .values()
            .filter(|m| m.domains.iter().any(|d| d == domain))
            .cloned()
            .collect();
        Ok(newest_first(hits, limit))
    }

    async fn count_messages(&self, channel_name: &str) -> Result<u64, HarvestError> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .keys()
            .filter(|(c, _)| c == channel_name)
            .count() as u64)
    }

    async fn top_domains(&self, k: usize) -> Result<Vec<DomainCount>, HarvestError> {
        let state = self.state.lock().await;
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for domain in state.messages.values().flat_map(|m| m.domains.iter()) {
            if !domain.is_empty() {
                *counts.entry(domain.as_str()).or_default() += 1;
            }
        }
        let mut rows: Vec<DomainCount> = counts
            .into_iter()
            .map(|(domain, count)| DomainCount::new(domain, count))
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.domain.cmp(&b.domain)));
        rows.truncate(k);
        Ok(rows)
    }

    async fn ensure_indexes(&self) -> Result<(), HarvestError> {
        let mut state = self.state.lock().await;
        state.ensure_index_calls += 1;
        if state.fail_ensure_indexes {
            return Err(injected("ensure_indexes"));
        }
        Ok(())
    }
}
