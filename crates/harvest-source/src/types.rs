// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway wire types.

use chrono::{DateTime, Utc};
use harvest_core::{MessageItem, PageOrder};
use serde::Deserialize;

/// Channel ids may arrive as JSON numbers or strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for WireId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Response of `GET /channels/{identifier}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelInfo {
    pub id: WireId,
    pub title: String,
}

/// Response of the page and replies endpoints.
///
/// Items stay untyped here so one malformed entry can be dropped without
/// failing the whole page.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub order: Option<PageOrder>,
    pub messages: Vec<serde_json::Value>,
}

/// One message as serialized by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    pub id: i64,
    #[serde(default)]
    pub text: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub sender_id: Option<i64>,
    #[serde(default)]
    pub chat_id: Option<i64>,
    #[serde(default)]
    pub reply_count: Option<u32>,
}

impl From<WireMessage> for MessageItem {
    fn from(wire: WireMessage) -> Self {
        MessageItem {
            id: wire.id,
            text: wire.text,
            timestamp: wire.date,
            sender_id: wire.sender_id,
            chat_id: wire.chat_id,
            reply_count: wire.reply_count.unwrap_or(0),
        }
    }
}

/// Error body; `retry_after` is in seconds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub retry_after: Option<f64>,
}
