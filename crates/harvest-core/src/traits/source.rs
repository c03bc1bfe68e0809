// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source adapter trait for message providers.

use async_trait::async_trait;

use crate::error::HarvestError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelHandle, MessageItem, PageOrder, PageRequest};

/// Adapter for a paginated, time-ordered message source.
///
/// Errors must be reported as [`HarvestError::RateLimited`],
/// [`HarvestError::Transient`] or [`HarvestError::Fatal`] so the retry
/// controller can tell them apart.
#[async_trait]
pub trait SourceAdapter: PluginAdapter {
    /// Order of items within a page returned by [`fetch_page`](Self::fetch_page).
    fn page_order(&self) -> PageOrder;

    /// Resolve a user-supplied channel identifier (URL, handle, id).
    async fn resolve_channel(&self, identifier: &str) -> Result<ChannelHandle, HarvestError>;

    /// Fetch up to `request.limit` items with `min_id < id` and, when
    /// `request.max_id != 0`, `id < max_id`.
    async fn fetch_page(
        &self,
        channel: &ChannelHandle,
        request: PageRequest,
    ) -> Result<Vec<MessageItem>, HarvestError>;

    /// Fetch up to `limit` replies to the channel post `parent_id`.
    async fn fetch_replies(
        &self,
        channel: &ChannelHandle,
        parent_id: i64,
        limit: usize,
    ) -> Result<Vec<MessageItem>, HarvestError>;
}
