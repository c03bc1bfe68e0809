// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resume-point lookup for a channel.

use harvest_core::{CursorStrategy, MessageStore};
use tracing::{debug, error};

/// Derives where an ingestion run starts from what is already persisted.
pub struct CursorTracker<'a> {
    store: &'a dyn MessageStore,
    strategy: CursorStrategy,
}

impl<'a> CursorTracker<'a> {
    pub fn new(store: &'a dyn MessageStore, strategy: CursorStrategy) -> Self {
        Self { store, strategy }
    }

    /// Source id of the newest stored message of `channel_name`, or `0` when
    /// the channel has nothing stored.
    ///
    /// A failed lookup is logged and reported as `0`: the run re-scans the
    /// channel from the beginning and upserts make the re-scan harmless.
    pub async fn resume_point(&self, channel_name: &str) -> i64 {
        let lookup = match self.strategy {
            CursorStrategy::Timestamp => self
                .store
                .find_latest(channel_name)
                .await
                .map(|latest| latest.map(|m| m.source_id)),
            CursorStrategy::MaxSourceId => self.store.max_source_id(channel_name).await,
        };

        match lookup {
            Ok(found) => {
                let last_id = found.unwrap_or(0);
                debug!(channel = channel_name, strategy = %self.strategy, last_id, "resume point");
                last_id
            }
            Err(e) => {
                error!(
                    channel = channel_name,
                    error = %e,
                    "cursor lookup failed, resuming from the beginning"
                );
                0
            }
        }
    }
}
