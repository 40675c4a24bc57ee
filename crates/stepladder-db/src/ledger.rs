//! The ledger: one table recording which step versions have been applied.
//!
//! Only the [`Migrator`](crate::Migrator) writes here. Every write happens on
//! the same transaction as the step action it records.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use stepladder_common::{Error, Result};
use tracing::debug;

pub const LEDGER_TABLE: &str = "migrations";

const CREATE_LEDGER_SQL: &str = "CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    version TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL,
    executed_at TEXT NOT NULL
)";

const SELECT_COLUMNS: &str = "SELECT id, version, description, executed_at FROM migrations";

/// A ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Surrogate key. Assigned in insertion order and never reused, so it
    /// breaks ties between rows that share an `executed_at`.
    pub id: i64,
    pub version: String,
    pub description: String,
    pub executed_at: DateTime<Utc>,
}

impl MigrationRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }

    fn build((id, version, description, executed_at): (i64, String, String, String)) -> Result<Self> {
        Ok(Self {
            id,
            executed_at: parse_timestamp(&executed_at)?,
            version,
            description,
        })
    }
}

/// Create the ledger table if it is missing.
pub fn ensure_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_LEDGER_SQL)
        .map_err(|e| Error::Initialization(format!("failed to create {LEDGER_TABLE} table: {e}")))
}

pub fn drop_table(conn: &Connection) -> Result<()> {
    conn.execute_batch("DROP TABLE IF EXISTS migrations")
        .map_err(|e| Error::Database(format!("failed to drop {LEDGER_TABLE} table: {e}")))
}

/// All applied records, oldest first.
pub fn applied(conn: &Connection) -> Result<Vec<MigrationRecord>> {
    let mut stmt = conn
        .prepare(&format!("{SELECT_COLUMNS} ORDER BY executed_at ASC, id ASC"))
        .map_err(|e| Error::Initialization(format!("failed to read {LEDGER_TABLE}: {e}")))?;

    let rows = stmt
        .query_map([], MigrationRecord::from_row)
        .map_err(|e| Error::Initialization(format!("failed to read {LEDGER_TABLE}: {e}")))?;

    let mut records = Vec::new();
    for row in rows {
        let raw =
            row.map_err(|e| Error::Initialization(format!("failed to read ledger row: {e}")))?;
        records.push(MigrationRecord::build(raw)?);
    }
    debug!("ledger holds {} applied migration(s)", records.len());
    Ok(records)
}

/// The most recently applied record, if any.
pub fn latest(conn: &Connection) -> Result<Option<MigrationRecord>> {
    let raw = conn
        .query_row(
            &format!("{SELECT_COLUMNS} ORDER BY executed_at DESC, id DESC LIMIT 1"),
            [],
            MigrationRecord::from_row,
        )
        .optional()
        .map_err(|e| Error::Initialization(format!("failed to fetch last migration: {e}")))?;

    raw.map(MigrationRecord::build).transpose()
}

/// Record `version` as applied, stamped no earlier than the newest existing row.
pub fn insert(conn: &Connection, version: &str, description: &str) -> Result<MigrationRecord> {
    let ledger_err = |reason: String| Error::LedgerWrite {
        version: version.to_string(),
        reason,
    };

    let executed_at = next_timestamp(conn).map_err(|e| ledger_err(e.to_string()))?;
    conn.execute(
        "INSERT INTO migrations (version, description, executed_at) VALUES (?1, ?2, ?3)",
        params![version, description, format_timestamp(&executed_at)],
    )
    .map_err(|e| ledger_err(format!("failed to record migration: {e}")))?;

    Ok(MigrationRecord {
        id: conn.last_insert_rowid(),
        version: version.to_string(),
        description: description.to_string(),
        executed_at,
    })
}

/// Remove exactly one record.
pub fn remove(conn: &Connection, record: &MigrationRecord) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM migrations WHERE id = ?1", params![record.id])
        .map_err(|e| Error::LedgerWrite {
            version: record.version.clone(),
            reason: format!("failed to remove migration record: {e}"),
        })?;

    if deleted != 1 {
        return Err(Error::LedgerWrite {
            version: record.version.clone(),
            reason: format!("expected to remove 1 record, removed {deleted}"),
        });
    }
    Ok(())
}

// Wall clocks can step backwards; the ledger order must not.
fn next_timestamp(conn: &Connection) -> Result<DateTime<Utc>> {
    let newest: Option<String> = conn
        .query_row("SELECT MAX(executed_at) FROM migrations", [], |row| row.get(0))
        .map_err(|e| Error::Database(format!("failed to read newest timestamp: {e}")))?;

    let now = Utc::now();
    match newest {
        Some(raw) => Ok(now.max(parse_timestamp(&raw)?)),
        None => Ok(now),
    }
}

// Fixed-width UTC so text ordering in SQL matches time ordering.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .map(|naive| naive.and_utc())
        })
        .map_err(|e| Error::Database(format!("invalid executed_at '{s}': {e}")))
}
