// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between SQLite and [`Message`].

use chrono::{DateTime, NaiveDateTime, Utc};
use harvest_core::Message;
use rusqlite::types::Type;

/// Timestamps are stored as fixed-width UTC text so lexical order matches
/// chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Column list shared by every query that materializes a [`Message`].
pub(crate) const MESSAGE_COLUMNS: &str =
    "channel_name, source_id, parent_id, text, timestamp, sender_id, chat_id, urls, domains";

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map(|naive| naive.and_utc())
}

/// Build a [`Message`] from a row selected with [`MESSAGE_COLUMNS`].
pub(crate) fn message_from_row(row: &rusqlite::Row<'_>) -> Result<Message, rusqlite::Error> {
    let raw_ts: String = row.get(4)?;
    let timestamp = parse_timestamp(&raw_ts)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    let urls: String = row.get(7)?;
    let domains: String = row.get(8)?;

    Ok(Message {
        channel_name: row.get(0)?,
        source_id: row.get(1)?,
        parent_id: row.get(2)?,
        text: row.get(3)?,
        timestamp,
        sender_id: row.get(5)?,
        chat_id: row.get(6)?,
        urls: json_list(7, &urls)?,
        domains: json_list(8, &domains)?,
    })
}

fn json_list(idx: usize, raw: &str) -> Result<Vec<String>, rusqlite::Error> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
