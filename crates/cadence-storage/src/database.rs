// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread; the `Database` struct IS the single writer. Query modules accept
//! `&Database` and go through `connection().call()`. Do NOT open additional
//! connections for writes.

use cadence_core::CadenceError;

/// Handle to the SQLite database behind a single async connection.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

/// Map a tokio-rusqlite error into the engine's storage error.
pub(crate) fn map_tr_err(err: tokio_rusqlite::Error) -> CadenceError {
    CadenceError::Storage {
        source: Box::new(err),
    }
}

impl Database {
    /// Open (creating if needed) the database at `path`, run pending
    /// migrations, and configure WAL-mode pragmas.
    pub async fn open(path: &str) -> Result<Self, CadenceError> {
        // Migrations run on a short-lived blocking connection before the
        // async connection takes over as the single writer.
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), CadenceError> {
            let mut conn = rusqlite::Connection::open(&migrate_path).map_err(|e| {
                CadenceError::Storage {
                    source: Box::new(e),
                }
            })?;
            crate::migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| CadenceError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path.to_string())
            .await
            .map_err(|e| CadenceError::Storage {
                source: Box::new(e),
            })?;

        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        Ok(Self { conn })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and release the connection.
    pub async fn close(&self) -> Result<(), CadenceError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_database_and_runs_migrations() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("open.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        // Migrated tables must exist.
        let count: i64 = db
            .connection()
            .call(|conn| {
                let count = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master
                     WHERE type = 'table' AND name IN
                     ('schedules', 'templates', 'recipients', 'groups', 'delivery_attempts')",
                    [],
                    |row| row.get(0),
                )?;
                Ok::<_, rusqlite::Error>(count)
            })
            .await
            .unwrap();
        assert_eq!(count, 5);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");
        let path = db_path.to_str().unwrap();

        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();
        drop(db);

        // Second open must not re-apply migrations or fail.
        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();
    }
}
