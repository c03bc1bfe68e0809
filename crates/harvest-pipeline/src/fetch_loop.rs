// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-channel batch fetch loop.
//!
//! One run resolves the channel, derives the resume point, then pulls pages
//! bounded below by it until the source returns an empty page. Items of a
//! page are processed concurrently and joined before the window moves on.

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, join_all};
use harvest_core::{ChannelHandle, HarvestError, Message, MessageItem};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::context::HarvestContext;
use crate::cursor::CursorTracker;
use crate::window::PageWindow;

/// Counters for one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Channel title the messages were stored under.
    pub channel: String,
    /// Non-empty pages fetched.
    pub pages: u64,
    /// Channel items handled (stored or failed).
    pub processed: u64,
    /// Messages written, replies included.
    pub stored: u64,
    /// Items dropped after a store or reply-fetch failure.
    pub failed: u64,
    /// Replies written.
    pub replies: u64,
}

#[derive(Debug, Default, Clone, Copy)]
struct ItemOutcome {
    stored: u64,
    failed: u64,
    replies: u64,
}

impl ItemOutcome {
    fn merge(&mut self, other: ItemOutcome) {
        self.stored += other.stored;
        self.failed += other.failed;
        self.replies += other.replies;
    }
}

/// Walks one channel page by page.
///
/// When a pass fails mid-walk, the window it stopped at is kept so the next
/// pass over the same channel finishes that stretch first instead of jumping
/// back to the newest stored message.
pub struct BatchFetchLoop<'a> {
    ctx: &'a HarvestContext,
    interrupted: Mutex<Option<(String, PageWindow)>>,
}

impl<'a> BatchFetchLoop<'a> {
    pub fn new(ctx: &'a HarvestContext) -> Self {
        Self {
            ctx,
            interrupted: Mutex::new(None),
        }
    }

    /// Run one full catch-up pass over the channel named by `identifier`.
    ///
    /// Source errors end the pass and are returned to the caller; per-item
    /// failures are logged and counted.
    pub async fn run(&self, identifier: &str) -> Result<RunSummary, HarvestError> {
        let channel = self.ctx.source.resolve_channel(identifier).await?;
        let mut window = match self.take_interrupted(&channel.title).await {
            Some(window) => {
                info!(
                    channel = %channel.title,
                    min_id = window.min_id(),
                    max_id = window.max_id(),
                    "continuing interrupted walk"
                );
                window
            }
            None => {
                let last_id =
                    CursorTracker::new(self.ctx.store.as_ref(), self.ctx.ingest.cursor_strategy)
                        .resume_point(&channel.title)
                        .await;
                info!(channel = %channel.title, last_id, "starting ingestion run");
                PageWindow::new(last_id, self.ctx.source.page_order())
            }
        };
        let mut summary = RunSummary {
            channel: channel.title.clone(),
            ..RunSummary::default()
        };

        match self.walk(&channel, &mut window, &mut summary).await {
            Ok(()) => {
                self.finish(&summary).await;
                Ok(summary)
            }
            Err(e) => {
                *self.interrupted.lock().await = Some((channel.title.clone(), window));
                Err(e)
            }
        }
    }

    async fn take_interrupted(&self, channel_name: &str) -> Option<PageWindow> {
        let mut slot = self.interrupted.lock().await;
        match slot.take() {
            Some((name, window)) if name == channel_name => Some(window),
            _ => None,
        }
    }

    /// Fetch and process pages until the source returns an empty one.
    async fn walk(
        &self,
        channel: &ChannelHandle,
        window: &mut PageWindow,
        summary: &mut RunSummary,
    ) -> Result<(), HarvestError> {
        loop {
            let request = window.request(self.ctx.ingest.batch_size);
            debug!(
                channel = %channel.title,
                min_id = request.min_id,
                max_id = request.max_id,
                limit = request.limit,
                "fetching page"
            );
            let page = self.ctx.source.fetch_page(channel, request).await?;
            if page.is_empty() {
                return Ok(());
            }

            summary.pages += 1;
            summary.processed += page.len() as u64;
            let outcomes = join_all(
                page.iter()
                    .map(|item| self.process_item(channel, item, None, 0)),
            )
            .await;
            let mut page_outcome = ItemOutcome::default();
            for outcome in outcomes {
                page_outcome.merge(outcome);
            }
            summary.stored += page_outcome.stored;
            summary.failed += page_outcome.failed;
            summary.replies += page_outcome.replies;

            info!(
                channel = %channel.title,
                count = page.len(),
                stored = page_outcome.stored,
                failed = page_outcome.failed,
                "page processed"
            );

            if !window.advance(page.iter().map(|item| item.id)) {
                warn!(
                    channel = %channel.title,
                    min_id = window.min_id(),
                    max_id = window.max_id(),
                    "source returned a page outside the requested bounds, stopping"
                );
                return Ok(());
            }

            if self.ctx.ingest.page_pause_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.ctx.ingest.page_pause_ms)).await;
            }
        }
    }

    async fn finish(&self, summary: &RunSummary) {
        if let Err(e) = self.ctx.store.ensure_indexes().await {
            warn!(channel = %summary.channel, error = %e, "index maintenance failed");
        }
        info!(
            channel = %summary.channel,
            pages = summary.pages,
            processed = summary.processed,
            stored = summary.stored,
            failed = summary.failed,
            replies = summary.replies,
            "channel caught up"
        );
    }

    /// Extract, store, and optionally descend into the item's replies.
    ///
    /// Never fails: every error is logged and counted in the outcome.
    fn process_item<'b>(
        &'b self,
        channel: &'b ChannelHandle,
        item: &'b MessageItem,
        parent_id: Option<i64>,
        depth: u32,
    ) -> BoxFuture<'b, ItemOutcome> {
        async move {
            let mut outcome = ItemOutcome::default();
            let channel_name = match parent_id {
                Some(_) => channel.replies_name(),
                None => channel.title.clone(),
            };

            let (urls, domains) = item
                .text
                .as_deref()
                .map(harvest_extract::extract)
                .unwrap_or_default()
                .into_parts();
            debug!(
                channel = %channel_name,
                source_id = item.id,
                urls = urls.len(),
                "extracted links"
            );

            let mut message = Message::from_item(channel_name.as_str(), item, urls, domains);
            if let Some(parent) = parent_id {
                message = message.with_parent(parent);
            }

            if let Err(e) = self.ctx.store.upsert_message(&message).await {
                error!(
                    channel = %channel_name,
                    source_id = item.id,
                    error = %e,
                    "failed to store message, dropping it"
                );
                outcome.failed += 1;
                return outcome;
            }
            outcome.stored += 1;
            if parent_id.is_some() {
                outcome.replies += 1;
            }

            let ingest = &self.ctx.ingest;
            if ingest.include_replies && item.reply_count > 0 && depth < ingest.max_reply_depth {
                outcome.merge(self.process_replies(channel, item.id, depth + 1).await);
            }
            outcome
        }
        .boxed()
    }

    async fn process_replies(
        &self,
        channel: &ChannelHandle,
        parent_id: i64,
        depth: u32,
    ) -> ItemOutcome {
        let replies = match self
            .ctx
            .source
            .fetch_replies(channel, parent_id, self.ctx.ingest.reply_limit)
            .await
        {
            Ok(replies) => replies,
            Err(e) => {
                warn!(
                    channel = %channel.title,
                    parent_id,
                    error = %e,
                    "failed to fetch replies, skipping thread"
                );
                return ItemOutcome {
                    failed: 1,
                    ..ItemOutcome::default()
                };
            }
        };

        let mut outcome = ItemOutcome::default();
        let results = join_all(
            replies
                .iter()
                .map(|reply| self.process_item(channel, reply, Some(parent_id), depth)),
        )
        .await;
        for result in results {
            outcome.merge(result);
        }
        outcome
    }
}
