// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread: `Database` wraps one `Connection` and every query function goes
//! through `db.connection().call()`. Do NOT create additional Connection
//! instances for writes; the single-writer pattern eliminates SQLITE_BUSY
//! errors under concurrent access.

use keepsake_core::KeepsakeError;
use tokio_rusqlite::Connection;
use tracing::info;

use crate::migrations::run_migrations;

/// Map tokio-rusqlite errors into `KeepsakeError::Storage`.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> KeepsakeError {
    KeepsakeError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the single-writer SQLite database.
///
/// Cheap to clone; all clones share the one background connection thread.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run
    /// all pending migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, KeepsakeError> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| KeepsakeError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = Connection::open(path).await.map_err(|e| KeepsakeError::Storage {
            source: Box::new(e),
        })?;
        configure_and_migrate(&conn, wal_mode).await?;
        info!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database with migrations applied. Test use only.
    pub async fn open_in_memory() -> Result<Self, KeepsakeError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| KeepsakeError::Storage {
                source: Box::new(e),
            })?;
        configure_and_migrate(&conn, false).await?;
        Ok(Self { conn })
    }

    /// Access the underlying connection for `call()`-based queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Flush and close the background connection.
    pub async fn close(self) -> Result<(), KeepsakeError> {
        self.conn
            .close()
            .await
            .map_err(|e| KeepsakeError::Storage {
                source: Box::new(e),
            })
    }
}

async fn configure_and_migrate(conn: &Connection, wal_mode: bool) -> Result<(), KeepsakeError> {
    conn.call(move |conn| {
        if wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "busy_timeout", 5000)?;
        Ok(())
    })
    .await
    .map_err(map_tr_err)?;

    conn.call(|conn| run_migrations(conn))
        .await
        .map_err(|e| match e {
            tokio_rusqlite::Error::Error(ke) => ke,
            other => KeepsakeError::Storage {
                source: Box::new(other),
            },
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .unwrap();

        assert!(tables.contains(&"chunks".to_string()));
        assert!(tables.contains(&"profiles".to_string()));
        assert!(tables.contains(&"upload_sessions".to_string()));
        assert!(tables.contains(&"upload_session_files".to_string()));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        db.close().await.unwrap();

        // Migrations already applied; a second open must not fail.
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn in_memory_open_works() {
        let db = Database::open_in_memory().await.unwrap();
        let count: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                let n = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
                Ok(n)
            })
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
