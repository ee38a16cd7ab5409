//! # Database Schema
//!
//! The two tables of the store and their idempotent creation.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          equipment.db                                   │
//! │                                                                         │
//! │  equipment                          transactions                        │
//! │  ─────────────────────────          ───────────────────────────────     │
//! │  id TEXT PK                    ◄─── equipment_id TEXT NOT NULL          │
//! │  name TEXT UNIQUE NOCASE            │  ON DELETE CASCADE                │
//! │  quantity INTEGER >= 0              id INTEGER PK AUTOINCREMENT         │
//! │  category TEXT                      timestamp DATETIME                  │
//! │  min_stock_level INTEGER            change_type TEXT                    │
//! │  last_updated DATETIME              old_quantity / new_quantity         │
//! │                                     notes TEXT                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The schema only grows additively: every statement uses `IF NOT EXISTS`,
//! so [`initialize`] is safe to call on every startup.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::pool::BEGIN_WRITE;

/// Current-state table.
///
/// `COLLATE NOCASE` makes the uniqueness backstop agree with the
/// case-insensitive duplicate checks done before writes.
const CREATE_EQUIPMENT: &str = r#"
CREATE TABLE IF NOT EXISTS equipment (
    id              TEXT PRIMARY KEY NOT NULL,
    name            TEXT NOT NULL UNIQUE COLLATE NOCASE,
    quantity        INTEGER NOT NULL CHECK (quantity >= 0),
    category        TEXT,
    min_stock_level INTEGER NOT NULL DEFAULT 0,
    last_updated    DATETIME NOT NULL
)
"#;

/// Append-only audit table.
const CREATE_TRANSACTIONS: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    equipment_id TEXT NOT NULL REFERENCES equipment(id) ON DELETE CASCADE,
    timestamp    DATETIME NOT NULL,
    change_type  TEXT,
    old_quantity INTEGER NOT NULL,
    new_quantity INTEGER NOT NULL,
    notes        TEXT
)
"#;

const CREATE_TRANSACTIONS_EQUIPMENT_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_transactions_equipment_id
    ON transactions(equipment_id)
"#;

const CREATE_TRANSACTIONS_TIMESTAMP_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_transactions_timestamp
    ON transactions(timestamp)
"#;

/// Statements run by [`initialize`], in order.
const SCHEMA: [&str; 4] = [
    CREATE_EQUIPMENT,
    CREATE_TRANSACTIONS,
    CREATE_TRANSACTIONS_EQUIPMENT_INDEX,
    CREATE_TRANSACTIONS_TIMESTAMP_INDEX,
];

/// Creates the tables and indexes if they are absent.
///
/// All statements run in one transaction: either the whole schema exists
/// afterwards or nothing changed.
pub async fn initialize(pool: &SqlitePool) -> DbResult<()> {
    info!("Ensuring database schema");

    let mut tx = pool.begin_with(BEGIN_WRITE).await.map_err(schema_error)?;

    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .map_err(schema_error)?;
    }

    tx.commit().await.map_err(schema_error)?;

    debug!(statements = SCHEMA.len(), "Schema initialized or already exists");
    Ok(())
}

/// Lists the user-defined schema objects as `(type, name)` pairs.
///
/// ## Usage
/// For diagnostics, and to check that repeated initialization does not
/// duplicate anything.
pub async fn schema_objects(pool: &SqlitePool) -> DbResult<Vec<(String, String)>> {
    let objects = sqlx::query_as::<_, (String, String)>(
        r#"
        SELECT type, name
        FROM sqlite_master
        WHERE name NOT LIKE 'sqlite_%'
        ORDER BY type, name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(objects)
}

fn schema_error(err: sqlx::Error) -> DbError {
    DbError::SchemaFailed(err.to_string())
}
