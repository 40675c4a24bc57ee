use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::Connection;
use stepladder_common::{Error, Result};
use stepladder_config::DatabaseConfig;
use tracing::info;

/// Handle to the relational store the migrations run against.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        info!("opening database at {}", config.path.display());
        let conn = Connection::open(&config.path)
            .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|e| Error::Database(format!("failed to set busy timeout: {e}")))?;

        Self::configure(conn, config.foreign_keys)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;

        Self::configure(conn, true)
    }

    fn configure(conn: Connection, foreign_keys: bool) -> Result<Self> {
        let fk = if foreign_keys { "ON" } else { "OFF" };
        conn.execute_batch(&format!(
            "PRAGMA journal_mode=WAL; PRAGMA foreign_keys={fk};"
        ))
        .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Exclusive access to the underlying connection.
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Database("store lock poisoned".into()))
    }

    /// Whether a table with this name exists.
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let conn = self.connection()?;
        table_exists(&conn, name)
    }
}

pub(crate) fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )
        .map_err(|e| Error::Database(format!("failed to inspect schema: {e}")))?;
    Ok(count > 0)
}
