// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message upsert and lookup operations.

use harvest_core::{HarvestError, Message};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{MESSAGE_COLUMNS, format_timestamp, message_from_row};
use crate::queries::sql_limit;

/// Insert a message or overwrite every field of the stored record with the
/// same `(channel_name, source_id)`.
///
/// The message row and its domain index rows are replaced in one
/// transaction, so readers never observe a half-written record.
pub async fn upsert_message(db: &Database, msg: &Message) -> Result<(), HarvestError> {
    let urls = serde_json::to_string(&msg.urls).map_err(|e| HarvestError::Storage {
        source: Box::new(e),
    })?;
    let domains_json = serde_json::to_string(&msg.domains).map_err(|e| HarvestError::Storage {
        source: Box::new(e),
    })?;
    let msg = msg.clone();
    let timestamp = format_timestamp(&msg.timestamp);
    let ingested_at = format_timestamp(&chrono::Utc::now());

    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO messages
                    (channel_name, source_id, parent_id, text, timestamp, sender_id, chat_id, urls, domains, ingested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT (channel_name, source_id) DO UPDATE SET
                    parent_id = excluded.parent_id,
                    text = excluded.text,
                    timestamp = excluded.timestamp,
                    sender_id = excluded.sender_id,
                    chat_id = excluded.chat_id,
                    urls = excluded.urls,
                    domains = excluded.domains,
                    ingested_at = excluded.ingested_at",
                params![
                    msg.channel_name,
                    msg.source_id,
                    msg.parent_id,
                    msg.text,
                    timestamp,
                    msg.sender_id,
                    msg.chat_id,
                    urls,
                    domains_json,
                    ingested_at,
                ],
            )?;
            tx.execute(
                "DELETE FROM message_domains WHERE channel_name = ?1 AND source_id = ?2",
                params![msg.channel_name, msg.source_id],
            )?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO message_domains (channel_name, source_id, position, domain)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for (position, domain) in msg.domains.iter().enumerate() {
                    stmt.execute(params![msg.channel_name, msg.source_id, position as i64, domain])?;
                }
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch one message by key.
pub async fn get_message(
    db: &Database,
    channel_name: &str,
    source_id: i64,
) -> Result<Option<Message>, HarvestError> {
    let channel_name = channel_name.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Message>, rusqlite::Error> {
            conn.query_row(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages
                     WHERE channel_name = ?1 AND source_id = ?2"
                ),
                params![channel_name, source_id],
                message_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// The most recent message of a channel by timestamp; ties go to the larger
/// source id.
pub async fn find_latest(
    db: &Database,
    channel_name: &str,
) -> Result<Option<Message>, HarvestError> {
    let channel_name = channel_name.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Message>, rusqlite::Error> {
            conn.query_row(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages
                     WHERE channel_name = ?1
                     ORDER BY timestamp DESC, source_id DESC LIMIT 1"
                ),
                params![channel_name],
                message_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Largest stored source id of a channel.
pub async fn max_source_id(db: &Database, channel_name: &str) -> Result<Option<i64>, HarvestError> {
    let channel_name = channel_name.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<i64>, rusqlite::Error> {
            conn.query_row(
                "SELECT MAX(source_id) FROM messages WHERE channel_name = ?1",
                params![channel_name],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Messages of a channel, newest first.
pub async fn find_by_channel(
    db: &Database,
    channel_name: &str,
    limit: Option<usize>,
) -> Result<Vec<Message>, HarvestError> {
    let channel_name = channel_name.to_string();
    let limit = sql_limit(limit);
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE channel_name = ?1
                 ORDER BY timestamp DESC, source_id DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![channel_name, limit], message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Messages (across channels) whose domain list contains `domain`, newest first.
pub async fn find_by_domain(
    db: &Database,
    domain: &str,
    limit: Option<usize>,
) -> Result<Vec<Message>, HarvestError> {
    let domain = domain.to_string();
    let limit = sql_limit(limit);
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages m
                 WHERE EXISTS (
                     SELECT 1 FROM message_domains d
                     WHERE d.channel_name = m.channel_name
                       AND d.source_id = m.source_id
                       AND d.domain = ?1
                 )
                 ORDER BY timestamp DESC, source_id DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![domain, limit], message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Number of stored messages for a channel.
pub async fn count_messages(db: &Database, channel_name: &str) -> Result<u64, HarvestError> {
    let channel_name = channel_name.to_string();
    let count = db
        .connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE channel_name = ?1",
                params![channel_name],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(count.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    async fn setup() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("messages.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    fn message(channel: &str, id: i64, minute: u32, domains: &[&str]) -> Message {
        Message {
            channel_name: channel.to_string(),
            source_id: id,
            parent_id: None,
            text: Some(format!("post {id}")),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 10, minute, 0).unwrap(),
            sender_id: Some(7),
            chat_id: None,
            urls: domains.iter().map(|d| format!("https://{d}/x")).collect(),
            domains: domains.iter().map(|d| d.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn upsert_then_get_returns_same_fields() {
        let (db, _dir) = setup().await;
        let msg = message("news", 42, 5, &["example.com", "rust-lang.org"]);
        upsert_message(&db, &msg).await.unwrap();

        let stored = get_message(&db, "news", 42).await.unwrap().unwrap();
        assert_eq!(stored, msg);
    }

    #[tokio::test]
    async fn get_missing_message_returns_none() {
        let (db, _dir) = setup().await;
        assert!(get_message(&db, "news", 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn repeated_upsert_keeps_one_record() {
        let (db, _dir) = setup().await;
        let msg = message("news", 1, 0, &["a.com"]);
        for _ in 0..3 {
            upsert_message(&db, &msg).await.unwrap();
        }
        assert_eq!(count_messages(&db, "news").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn upsert_overwrites_fields_and_domain_index() {
        let (db, _dir) = setup().await;
        upsert_message(&db, &message("news", 1, 0, &["a.com", "b.com"]))
            .await
            .unwrap();

        let mut edited = message("news", 1, 0, &["c.com"]);
        edited.text = Some("edited".into());
        upsert_message(&db, &edited).await.unwrap();

        let stored = get_message(&db, "news", 1).await.unwrap().unwrap();
        assert_eq!(stored.text.as_deref(), Some("edited"));
        assert_eq!(stored.domains, vec!["c.com"]);
        assert!(find_by_domain(&db, "a.com", None).await.unwrap().is_empty());
        assert_eq!(find_by_domain(&db, "c.com", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn same_source_id_in_different_channels_are_distinct() {
        let (db, _dir) = setup().await;
        upsert_message(&db, &message("news", 9, 0, &[])).await.unwrap();
        upsert_message(&db, &message("news#replies", 9, 0, &[]))
            .await
            .unwrap();
        assert_eq!(count_messages(&db, "news").await.unwrap(), 1);
        assert_eq!(count_messages(&db, "news#replies").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn find_latest_orders_by_timestamp_not_id() {
        let (db, _dir) = setup().await;
        upsert_message(&db, &message("news", 100, 1, &[])).await.unwrap();
        upsert_message(&db, &message("news", 50, 30, &[])).await.unwrap();
        upsert_message(&db, &message("other", 500, 59, &[])).await.unwrap();

        let latest = find_latest(&db, "news").await.unwrap().unwrap();
        assert_eq!(latest.source_id, 50);
        assert_eq!(max_source_id(&db, "news").await.unwrap(), Some(100));
    }

    #[tokio::test]
    async fn empty_channel_has_no_latest_and_no_max() {
        let (db, _dir) = setup().await;
        assert!(find_latest(&db, "news").await.unwrap().is_none());
        assert_eq!(max_source_id(&db, "news").await.unwrap(), None);
        assert_eq!(count_messages(&db, "news").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn find_by_channel_is_newest_first_and_limited() {
        let (db, _dir) = setup().await;
        for (id, minute) in [(1, 10), (2, 20), (3, 30)] {
            upsert_message(&db, &message("news", id, minute, &[])).await.unwrap();
        }

        let all = find_by_channel(&db, "news", None).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|m| m.source_id).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let two = find_by_channel(&db, "news", Some(2)).await.unwrap();
        assert_eq!(two.len(), 2);
        assert_eq!(two[0].source_id, 3);
    }

    #[tokio::test]
    async fn find_by_domain_returns_each_message_once() {
        let (db, _dir) = setup().await;
        upsert_message(&db, &message("news", 1, 0, &["a.com", "a.com"]))
            .await
            .unwrap();
        upsert_message(&db, &message("news", 2, 1, &["b.com"])).await.unwrap();

        let hits = find_by_domain(&db, "a.com", None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source_id, 1);
    }

    #[tokio::test]
    async fn concurrent_upserts_of_distinct_keys_all_land() {
        let (db, _dir) = setup().await;
        let msgs: Vec<Message> = (1..=20).map(|id| message("news", id, 0, &["a.com"])).collect();
        let results = futures::future::join_all(msgs.iter().map(|m| upsert_message(&db, m))).await;
        assert!(results.iter().all(Result::is_ok));
        assert_eq!(count_messages(&db, "news").await.unwrap(), 20);
    }
}
