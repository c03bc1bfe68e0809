// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use harvest_core::HarvestError;
use tokio_rusqlite::Connection;
use tracing::debug;

/// Handle to an opened, migrated SQLite database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path`, apply PRAGMAs and run
    /// pending migrations.
    ///
    /// Missing parent directories are created. `":memory:"` opens a private
    /// in-memory database.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, HarvestError> {
        if path != ":memory:"
            && let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| HarvestError::Storage {
                    source: Box::new(e),
                })?;
        }

        let conn = if path == ":memory:" {
            Connection::open_in_memory().await
        } else {
            Connection::open(path).await
        }
        .map_err(|e| HarvestError::Storage {
            source: Box::new(e),
        })?;

        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if wal_mode {
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            }
            conn.execute_batch(
                "PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(crate::migrations::run_migrations)
            .await
            .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened and migrated");
        Ok(Self { conn })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the main database file is self-contained.
    pub async fn close(&self) -> Result<(), HarvestError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Map a `tokio_rusqlite` call error into a storage error.
pub fn map_tr_err<E>(e: tokio_rusqlite::Error<E>) -> HarvestError
where
    E: std::error::Error + Send + Sync + 'static,
{
    HarvestError::Storage {
        source: Box::new(e),
    }
}
