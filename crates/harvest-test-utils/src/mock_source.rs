// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock source adapter for deterministic testing.
//!
//! `MockSource` serves pages out of an in-memory channel history, honouring
//! the exclusive `min_id`/`max_id` bounds like a real source. Failures can be
//! queued ahead of the next calls, and every call is recorded with the
//! (tokio) instant it was made so tests can assert on back-off timing.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use harvest_core::{
    AdapterType, ChannelHandle, HarvestError, HealthStatus, MessageItem, PageOrder, PageRequest,
    PluginAdapter, SourceAdapter,
};

/// One recorded call against the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceCall {
    Resolve { identifier: String, at: Instant },
    Page { request: PageRequest, at: Instant },
    Replies { parent_id: i64, limit: usize, at: Instant },
}

impl SourceCall {
    pub fn at(&self) -> Instant {
        match self {
            Self::Resolve { at, .. } | Self::Page { at, .. } | Self::Replies { at, .. } => *at,
        }
    }
}

#[derive(Default)]
struct State {
    history: Vec<MessageItem>,
    replies: HashMap<i64, Vec<MessageItem>>,
    failures: VecDeque<HarvestError>,
    page_failures: HashMap<usize, HarvestError>,
    page_calls: usize,
    calls: Vec<SourceCall>,
}

/// A mock source holding one channel's full history.
pub struct MockSource {
    handle: ChannelHandle,
    identifier: String,
    order: PageOrder,
    max_page_len: Option<usize>,
    state: Arc<Mutex<State>>,
}

impl MockSource {
    /// A newest-first source for channel `identifier` titled `title`.
    pub fn new(identifier: &str, title: &str) -> Self {
        Self {
            handle: ChannelHandle {
                id: identifier.to_string(),
                title: title.to_string(),
            },
            identifier: identifier.to_string(),
            order: PageOrder::NewestFirst,
            max_page_len: None,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Serve pages in the given order.
    pub fn with_order(mut self, order: PageOrder) -> Self {
        self.order = order;
        self
    }

    /// Never return more than `len` items per page, whatever the limit.
    pub fn with_max_page_len(mut self, len: usize) -> Self {
        self.max_page_len = Some(len);
        self
    }

    /// The handle returned by `resolve_channel`.
    pub fn handle(&self) -> ChannelHandle {
        self.handle.clone()
    }

    /// Append items to the channel history.
    pub async fn push_items(&self, items: impl IntoIterator<Item = MessageItem>) {
        self.state.lock().await.history.extend(items);
    }

    /// Set the reply thread of `parent_id`.
    pub async fn set_replies(&self, parent_id: i64, replies: Vec<MessageItem>) {
        self.state.lock().await.replies.insert(parent_id, replies);
    }

    /// Queue an error; the next call of any kind fails with it.
    pub async fn push_failure(&self, error: HarvestError) {
        self.state.lock().await.failures.push_back(error);
    }

    /// Fail the `n`-th page request (0-based, counted over the mock's lifetime).
    pub async fn fail_nth_page(&self, n: usize, error: HarvestError) {
        self.state.lock().await.page_failures.insert(n, error);
    }

    /// All calls made so far, in order.
    pub async fn calls(&self) -> Vec<SourceCall> {
        self.state.lock().await.calls.clone()
    }

    /// Page requests made so far, in order.
    pub async fn page_requests(&self) -> Vec<PageRequest> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|c| match c {
                SourceCall::Page { request, .. } => Some(request),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, call: SourceCall) -> Result<(), HarvestError> {
        let mut state = self.state.lock().await;
        state.calls.push(call);
        match state.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn cap(&self, limit: usize) -> usize {
        self.max_page_len.map_or(limit, |max| max.min(limit))
    }
}

#[async_trait]
impl PluginAdapter for MockSource {
    fn name(&self) -> &str {
        "mock-source"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Source
    }

    async fn health_check(&self) -> Result<HealthStatus, HarvestError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HarvestError> {
        Ok(())
    }
}

#[async_trait]
impl SourceAdapter for MockSource {
    fn page_order(&self) -> PageOrder {
        self.order
    }

    async fn resolve_channel(&self, identifier: &str) -> Result<ChannelHandle, HarvestError> {
        self.record(SourceCall::Resolve {
            identifier: identifier.to_string(),
            at: Instant::now(),
        })
        .await?;
        if identifier != self.identifier {
            return Err(HarvestError::Fatal {
                message: format!("unknown channel `{identifier}`"),
            });
        }
        Ok(self.handle.clone())
    }

    async fn fetch_page(
        &self,
        _channel: &ChannelHandle,
        request: PageRequest,
    ) -> Result<Vec<MessageItem>, HarvestError> {
        self.record(SourceCall::Page {
            request,
            at: Instant::now(),
        })
        .await?;

        let mut state = self.state.lock().await;
        let nth = state.page_calls;
        state.page_calls += 1;
        if let Some(err) = state.page_failures.remove(&nth) {
            return Err(err);
        }
        let mut page: Vec<MessageItem> = state
            .history
            .iter()
            .filter(|i| i.id > request.min_id && (request.max_id == 0 || i.id < request.max_id))
            .cloned()
            .collect();
        match self.order {
            PageOrder::NewestFirst => page.sort_by(|a, b| b.id.cmp(&a.id)),
            PageOrder::OldestFirst => page.sort_by_key(|i| i.id),
        }
        page.truncate(self.cap(request.limit));
        Ok(page)
    }

    async fn fetch_replies(
        &self,
        _channel: &ChannelHandle,
        parent_id: i64,
        limit: usize,
    ) -> Result<Vec<MessageItem>, HarvestError> {
        self.record(SourceCall::Replies {
            parent_id,
            limit,
            at: Instant::now(),
        })
        .await?;

        let state = self.state.lock().await;
        let mut replies = state.replies.get(&parent_id).cloned().unwrap_or_default();
        replies.truncate(limit);
        Ok(replies)
    }
}
