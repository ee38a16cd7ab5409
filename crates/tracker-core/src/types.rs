//! # Domain Types
//!
//! Records and inputs used throughout the equipment tracker.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐          ┌──────────────────┐                     │
//! │  │    Equipment    │ 1      * │   Transaction    │                     │
//! │  │  ─────────────  │◄─────────│  ──────────────  │                     │
//! │  │  id (UUID)      │ cascade  │  id (autoinc)    │                     │
//! │  │  name (unique)  │          │  equipment_id FK │                     │
//! │  │  quantity >= 0  │          │  old → new qty   │                     │
//! │  │  last_updated   │          │  timestamp       │                     │
//! │  └─────────────────┘          └──────────────────┘                     │
//! │   mutable current state        append-only audit log                   │
//! │                                                                         │
//! │  Inputs: NewEquipment, EquipmentUpdate, HistoryQuery                   │
//! │  Projections: HistoryEntry (Transaction + equipment name)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entities are plain data. Callers that show them refresh explicitly after a
//! write; there is no change-notification machinery here.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Returns the current time truncated to millisecond precision.
///
/// Timestamps are stored as RFC 3339 text; keeping a fixed precision makes
/// text order match time order for range queries.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Generates a new equipment ID.
pub fn generate_equipment_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Equipment
// =============================================================================

/// A countable item and its current stock (the mutable current-state record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    /// Unique identifier (UUID v4), immutable once assigned.
    pub id: String,

    /// Display name, unique across all equipment.
    pub name: String,

    /// Units on hand. Never negative after a committed write.
    pub quantity: i64,

    /// Free-form grouping; empty when not set.
    pub category: String,

    /// Advisory reorder threshold, used for alerting only.
    pub min_stock_level: i64,

    /// When the row was last written.
    pub last_updated: DateTime<Utc>,
}

impl Equipment {
    /// Checks if stock has fallen below the advisory minimum.
    pub fn is_below_min_stock(&self) -> bool {
        self.quantity < self.min_stock_level
    }

    /// Checks if `delta` can be applied without going negative.
    pub fn can_adjust(&self, delta: i64) -> bool {
        matches!(self.quantity.checked_add(delta), Some(q) if q >= 0)
    }
}

/// Input for creating a new piece of equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEquipment {
    pub name: String,
    pub quantity: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub min_stock_level: i64,
}

impl NewEquipment {
    /// Creates input with the given name and quantity, no category and no minimum.
    pub fn new(name: impl Into<String>, quantity: i64) -> Self {
        NewEquipment {
            name: name.into(),
            quantity,
            category: String::new(),
            min_stock_level: 0,
        }
    }

    /// Sets the category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the advisory minimum stock level.
    pub fn min_stock_level(mut self, min: i64) -> Self {
        self.min_stock_level = min;
        self
    }

    /// Turns the input into a full record with a fresh ID, stamped at `now`.
    ///
    /// The name and category are trimmed here so that storage and the
    /// uniqueness check see the same value.
    pub fn into_equipment(self, now: DateTime<Utc>) -> Equipment {
        Equipment {
            id: generate_equipment_id(),
            name: self.name.trim().to_string(),
            quantity: self.quantity,
            category: self.category.trim().to_string(),
            min_stock_level: self.min_stock_level,
            last_updated: now,
        }
    }
}

/// Field-only edit of an existing item.
///
/// Quantity is deliberately absent: quantity changes go through the
/// audited adjustment path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentUpdate {
    pub name: String,
    pub category: String,
    pub min_stock_level: i64,
}

impl From<&Equipment> for EquipmentUpdate {
    fn from(eq: &Equipment) -> Self {
        EquipmentUpdate {
            name: eq.name.clone(),
            category: eq.category.clone(),
            min_stock_level: eq.min_stock_level,
        }
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// One audit-log row: a single quantity change of one item.
///
/// Created once and never modified; removed only when its equipment is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Store-assigned, monotonically increasing.
    pub id: i64,
    pub equipment_id: String,
    /// Same instant as the owning equipment's `last_updated` for that write.
    pub timestamp: DateTime<Utc>,
    pub change_type: String,
    pub old_quantity: i64,
    pub new_quantity: i64,
    pub notes: String,
}

impl Transaction {
    /// Signed change recorded by this entry.
    pub fn delta(&self) -> i64 {
        self.new_quantity - self.old_quantity
    }
}

/// A transaction joined with the name of its equipment, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub transaction: Transaction,
    pub equipment_name: String,
}

// =============================================================================
// History Query
// =============================================================================

/// Filter for a history search.
///
/// ## Semantics
/// - `start..=end` is a closed interval on `timestamp`
/// - a non-blank `search_term` must appear (case-insensitively) in the
///   equipment name, the change type or the notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub search_term: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl HistoryQuery {
    /// Creates a query over `[start, end]` with no text filter.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        HistoryQuery {
            search_term: None,
            start,
            end,
        }
    }

    /// Adds a free-text filter.
    pub fn matching(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    /// Returns the trimmed search term, or `None` when blank.
    pub fn term(&self) -> Option<&str> {
        self.search_term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Checks the range is not inverted. Any term length is accepted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        crate::validation::validate_date_range(self.start, self.end)
    }
}

// =============================================================================
// Import
// =============================================================================

/// Outcome of a bulk import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Rows written to the store.
    pub added: usize,
    /// Rows whose name was already present or queued earlier in the file.
    pub skipped_duplicates: usize,
    /// Rows that parsed but failed validation (e.g. negative quantity).
    pub skipped_invalid: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(quantity: i64, min: i64) -> Equipment {
        NewEquipment::new("Drill", quantity)
            .min_stock_level(min)
            .into_equipment(now_millis())
    }

    #[test]
    fn test_below_min_stock() {
        assert!(sample(2, 5).is_below_min_stock());
        assert!(!sample(5, 5).is_below_min_stock());
        assert!(!sample(0, 0).is_below_min_stock());
    }

    #[test]
    fn test_can_adjust() {
        let eq = sample(8, 0);
        assert!(eq.can_adjust(-8));
        assert!(eq.can_adjust(3));
        assert!(!eq.can_adjust(-9));
        assert!(!eq.can_adjust(i64::MAX));
    }

    #[test]
    fn test_into_equipment_trims_and_assigns_id() {
        let now = now_millis();
        let eq = NewEquipment::new("  Ladder ", 3)
            .category(" Tools ")
            .into_equipment(now);

        assert_eq!(eq.name, "Ladder");
        assert_eq!(eq.category, "Tools");
        assert_eq!(eq.last_updated, now);
        assert!(uuid::Uuid::parse_str(&eq.id).is_ok());
    }

    #[test]
    fn test_now_millis_has_no_sub_millisecond_part() {
        let now = now_millis();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn test_history_query_term() {
        let now = now_millis();
        let q = HistoryQuery::between(now - Duration::days(1), now);
        assert_eq!(q.term(), None);
        assert_eq!(q.clone().matching("   ").term(), None);
        assert_eq!(q.matching(" drill ").term(), Some("drill"));
    }

    #[test]
    fn test_history_query_rejects_inverted_range() {
        let now = now_millis();
        let q = HistoryQuery::between(now, now - Duration::seconds(1));
        assert!(q.validate().is_err());
        assert!(HistoryQuery::between(now, now).validate().is_ok());
    }

    #[test]
    fn test_history_query_accepts_long_term() {
        let now = now_millis();
        let q = HistoryQuery::between(now - Duration::days(1), now).matching("x".repeat(500));
        assert!(q.validate().is_ok());
    }

    #[test]
    fn test_history_entry_serializes_flat() {
        let entry = HistoryEntry {
            transaction: Transaction {
                id: 1,
                equipment_id: "e1".to_string(),
                timestamp: now_millis(),
                change_type: "Manual Update".to_string(),
                old_quantity: 5,
                new_quantity: 8,
                notes: String::new(),
            },
            equipment_name: "Drill".to_string(),
        };
        assert_eq!(entry.transaction.delta(), 3);

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["equipmentName"], "Drill");
        assert_eq!(json["newQuantity"], 8);
    }
}
