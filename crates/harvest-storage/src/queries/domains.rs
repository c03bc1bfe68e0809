// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain aggregation and index maintenance.

use harvest_core::{DomainCount, HarvestError};
use rusqlite::params;
use tracing::debug;

use crate::database::{Database, map_tr_err};
use crate::queries::sql_limit;

const INDEX_DDL: &str = "
    CREATE INDEX IF NOT EXISTS idx_messages_channel ON messages (channel_name);
    CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages (timestamp);
    CREATE INDEX IF NOT EXISTS idx_messages_channel_timestamp ON messages (channel_name, timestamp);
    CREATE INDEX IF NOT EXISTS idx_message_domains_domain ON message_domains (domain);
";

/// Count every domain occurrence across all stored messages.
///
/// A domain listed twice in one message counts twice. Rows are ordered by
/// count descending, then domain ascending, and truncated to `k`.
pub async fn top_domains(db: &Database, k: usize) -> Result<Vec<DomainCount>, HarvestError> {
    if k == 0 {
        return Ok(Vec::new());
    }
    let limit = sql_limit(Some(k));
    db.connection()
        .call(move |conn| -> Result<Vec<DomainCount>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT domain, COUNT(*) AS mentions
                 FROM message_domains
                 WHERE domain <> ''
                 GROUP BY domain
                 ORDER BY mentions DESC, domain ASC
                 LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                let count: i64 = row.get(1)?;
                Ok(DomainCount::new(row.get::<_, String>(0)?, count.max(0) as u64))
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Declare the secondary indexes (no-op when present) and refresh planner
/// statistics.
pub async fn ensure_indexes(db: &Database) -> Result<(), HarvestError> {
    db.connection()
        .call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(INDEX_DDL)?;
            conn.execute_batch("PRAGMA optimize;")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    debug!("secondary indexes ensured");
    Ok(())
}
