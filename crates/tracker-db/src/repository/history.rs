//! # History Repository
//!
//! Read-only queries over the append-only audit log.
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    History Search                                       │
//! │                                                                         │
//! │  HistoryQuery { term: "drill", start, end }                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  transactions ⋈ equipment (for the name)                               │
//! │       │                                                                 │
//! │       ├── timestamp BETWEEN start AND end   (both inclusive)           │
//! │       └── name / change_type / notes LIKE %drill%   (any one)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  newest first                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The term is matched as a literal substring: `%`, `_` and `\` typed by
//! the user carry no wildcard meaning.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use tracker_core::{HistoryEntry, HistoryQuery, Transaction};

/// Repository for audit-log queries.
///
/// Never writes: audit rows are appended only by [`EquipmentRepository`]
/// in the same unit as the quantity change they describe.
///
/// [`EquipmentRepository`]: super::equipment::EquipmentRepository
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    pool: SqlitePool,
}

impl HistoryRepository {
    /// Creates a new HistoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        HistoryRepository { pool }
    }

    /// Searches history within a time window, optionally filtered by text.
    ///
    /// ## Arguments
    /// * `query` - Inclusive `[start, end]` window and optional search term.
    ///   A blank term means "no text filter".
    ///
    /// ## Returns
    /// Entries ordered by timestamp descending, each with its equipment's
    /// current name.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let last_week = HistoryQuery::between(now - Duration::days(7), now).matching("drill");
    /// let entries = db.history().search(&last_week).await?;
    /// ```
    pub async fn search(&self, query: &HistoryQuery) -> DbResult<Vec<HistoryEntry>> {
        query.validate()?;

        let pattern = query.term().map(|term| format!("%{}%", escape_like(term)));

        debug!(
            term = ?query.term(),
            start = %query.start,
            end = %query.end,
            "Searching history"
        );

        let entries = sqlx::query_as::<_, HistoryEntry>(
            r#"
            SELECT
                t.id,
                t.equipment_id,
                t.timestamp,
                COALESCE(t.change_type, '') AS change_type,
                t.old_quantity,
                t.new_quantity,
                COALESCE(t.notes, '') AS notes,
                e.name AS equipment_name
            FROM transactions t
            INNER JOIN equipment e ON e.id = t.equipment_id
            WHERE t.timestamp BETWEEN ?1 AND ?2
              AND (
                    ?3 IS NULL
                 OR e.name LIKE ?3 ESCAPE '\'
                 OR t.change_type LIKE ?3 ESCAPE '\'
                 OR t.notes LIKE ?3 ESCAPE '\'
              )
            ORDER BY t.timestamp DESC, t.id DESC
            "#,
        )
        .bind(query.start)
        .bind(query.end)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = entries.len(), "History search returned entries");
        Ok(entries)
    }

    /// Lists the audit trail of one item, oldest first.
    pub async fn for_equipment(&self, equipment_id: &str) -> DbResult<Vec<Transaction>> {
        let entries = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT
                id,
                equipment_id,
                timestamp,
                COALESCE(change_type, '') AS change_type,
                old_quantity,
                new_quantity,
                COALESCE(notes, '') AS notes
            FROM transactions
            WHERE equipment_id = ?1
            ORDER BY id ASC
            "#,
        )
        .bind(equipment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Counts audit entries of one item.
    pub async fn count_for(&self, equipment_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE equipment_id = ?1")
                .bind(equipment_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Counts every audit entry.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Escapes LIKE metacharacters so the term matches literally (`ESCAPE '\'`).
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// =============================================================================
// Unit Tests
// =============================================================================
