// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Value types shared across the source boundary, the pipeline, and storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::HarvestError;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Source,
    Store,
}

/// A resolved channel on the message source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHandle {
    /// Opaque source-side identifier used in subsequent requests.
    pub id: String,
    /// Human-readable title; used as the `channel_name` of stored messages.
    pub title: String,
}

impl ChannelHandle {
    /// Build a handle, rejecting empty identifiers or titles.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Result<Self, HarvestError> {
        let id = id.into();
        let title = title.into();
        if id.trim().is_empty() {
            return Err(HarvestError::Fatal {
                message: "channel handle has an empty id".into(),
            });
        }
        if title.trim().is_empty() {
            return Err(HarvestError::Fatal {
                message: format!("channel `{id}` has an empty title"),
            });
        }
        Ok(Self { id, title })
    }

    /// Channel name under which reply sub-threads of this channel are stored.
    ///
    /// Replies live in a separate id space on the source, so they must not
    /// share a key range (or a cursor) with the channel's own posts.
    pub fn replies_name(&self) -> String {
        format!("{}#replies", self.title)
    }
}

/// A single item as delivered by the message source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageItem {
    pub id: i64,
    pub text: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub sender_id: Option<i64>,
    pub chat_id: Option<i64>,
    pub reply_count: u32,
}

impl MessageItem {
    /// Create an item with only the required fields set.
    pub fn new(id: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            text: None,
            timestamp,
            sender_id: None,
            chat_id: None,
            reply_count: 0,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_sender(mut self, sender_id: i64) -> Self {
        self.sender_id = Some(sender_id);
        self
    }

    pub fn with_chat(mut self, chat_id: i64) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    pub fn with_reply_count(mut self, reply_count: u32) -> Self {
        self.reply_count = reply_count;
        self
    }

    /// Check the invariants the pipeline relies on.
    ///
    /// Source ids are positive; `0` is reserved as the "no bound" sentinel
    /// in page requests and as the empty cursor.
    pub fn validate(self) -> Result<Self, HarvestError> {
        if self.id <= 0 {
            return Err(HarvestError::Transient {
                message: format!("source returned message with invalid id {}", self.id),
                source: None,
            });
        }
        Ok(self)
    }
}

/// A persisted message with its extracted links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub channel_name: String,
    pub source_id: i64,
    /// Set for reply sub-thread items; the id of the channel post they answer.
    pub parent_id: Option<i64>,
    pub text: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub sender_id: Option<i64>,
    pub chat_id: Option<i64>,
    pub urls: Vec<String>,
    pub domains: Vec<String>,
}

impl Message {
    /// Build a storable message from a source item and its extraction result.
    ///
    /// Empty domain entries (links whose registrable domain could not be
    /// derived) are dropped here; the links themselves are kept.
    pub fn from_item(
        channel_name: impl Into<String>,
        item: &MessageItem,
        urls: Vec<String>,
        domains: Vec<String>,
    ) -> Self {
        Self {
            channel_name: channel_name.into(),
            source_id: item.id,
            parent_id: None,
            text: item.text.clone(),
            timestamp: item.timestamp,
            sender_id: item.sender_id,
            chat_id: item.chat_id,
            urls,
            domains: domains.into_iter().filter(|d| !d.is_empty()).collect(),
        }
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// One row of the domain-mention aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCount {
    pub domain: String,
    pub count: u64,
}

impl DomainCount {
    pub fn new(domain: impl Into<String>, count: u64) -> Self {
        Self {
            domain: domain.into(),
            count,
        }
    }
}

/// The order in which a source returns the items of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageOrder {
    NewestFirst,
    OldestFirst,
}

/// Bounds for a single page request.
///
/// Both bounds are exclusive. `max_id == 0` means "no upper bound".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub min_id: i64,
    pub max_id: i64,
    pub limit: usize,
}

/// How the resume point is derived from persisted messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CursorStrategy {
    /// `source_id` of the most recent message by timestamp.
    #[default]
    Timestamp,
    /// Largest stored `source_id`.
    MaxSourceId,
}
