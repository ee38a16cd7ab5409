//! # Equipment Repository
//!
//! Current-state reads and the write protocol for equipment.
//!
//! ## Write Protocol
//! Every quantity mutation is paired with exactly one audit row, in the same
//! atomic unit. Either both land or neither does.
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Write Unit                                       │
//! │                                                                         │
//! │  validate input            (no lock, no transaction yet)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  WriteLock::lock()         (one writer per process)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN IMMEDIATE           (SQLite file write lock)                    │
//! │  ├── re-fetch row          ← gone?      → ConcurrentDeletion           │
//! │  ├── current + delta       ← below 0?   → InsufficientQuantity         │
//! │  ├── UPDATE equipment      (quantity, last_updated = now)              │
//! │  └── INSERT transactions   (old, new, timestamp = now)                 │
//! │  COMMIT                    any failure above → ROLLBACK, then error    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  release WriteLock                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! The re-fetch, the check and the write all happen while the write lock is
//! held and inside one `BEGIN IMMEDIATE` transaction. A second writer in this
//! process waits on the lock; a writer on another handle or in another
//! process waits on SQLite's file lock (bounded by the busy timeout). Either
//! way it re-reads committed state, so a check can never pass against a
//! quantity that has since changed.

use sqlx::sqlite::Sqlite;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, error, info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::{WriteLock, BEGIN_WRITE};
use tracker_core::import::{plan_import, ParsedImport};
use tracker_core::validation::{
    apply_delta, validate_delta, validate_equipment_update, validate_new_equipment,
    validate_quantity,
};
use tracker_core::{
    now_millis, CoreError, Equipment, EquipmentUpdate, ImportSummary, NewEquipment, Transaction,
    CHANGE_INITIAL_CREATION,
};

/// Column list shared by every equipment read.
///
/// `category` is nullable in the schema; callers always see a string.
macro_rules! equipment_select {
    ($rest:literal) => {
        concat!(
            "SELECT id, name, quantity, COALESCE(category, '') AS category, ",
            "min_stock_level, last_updated FROM equipment ",
            $rest
        )
    };
}

/// How a quantity mutation is expressed by the caller.
#[derive(Debug, Clone, Copy)]
enum QuantityChange {
    /// Add this (possibly negative) amount to the fresh quantity.
    Delta(i64),
    /// Set the quantity to this value, whatever it is now.
    Absolute(i64),
}

/// Repository for equipment rows and their paired audit entries.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.equipment();
///
/// let drill = repo.create(NewEquipment::new("Drill", 5), None, "").await?;
/// let drill = repo.adjust_quantity(&drill.id, 3, "Manual Update", "").await?;
/// repo.delete(&drill.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct EquipmentRepository {
    pool: SqlitePool,
    write_lock: WriteLock,
}

impl EquipmentRepository {
    /// Creates a new EquipmentRepository.
    pub(crate) fn new(pool: SqlitePool, write_lock: WriteLock) -> Self {
        EquipmentRepository { pool, write_lock }
    }

    /// Opens a write unit. Callers hold the write lock first.
    async fn begin_unit(&self) -> DbResult<sqlx::Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with(BEGIN_WRITE).await?)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lists every equipment row, ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Equipment>> {
        let equipment = sqlx::query_as::<_, Equipment>(equipment_select!("ORDER BY name"))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = equipment.len(), "Listed equipment");
        Ok(equipment)
    }

    /// Gets one equipment row by id.
    ///
    /// ## Returns
    /// * `Ok(Some(Equipment))` - Row found
    /// * `Ok(None)` - No such row
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Equipment>> {
        let equipment = sqlx::query_as::<_, Equipment>(equipment_select!("WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(equipment)
    }

    /// Gets one equipment row by name, compared case-insensitively.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Equipment>> {
        let equipment = sqlx::query_as::<_, Equipment>(equipment_select!("WHERE name = ?1"))
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(equipment)
    }

    /// Returns true if some row already uses `name`.
    ///
    /// The column is `COLLATE NOCASE`, so "drill" matches "Drill".
    pub async fn name_exists(&self, name: &str) -> DbResult<bool> {
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM equipment WHERE name = ?1)")
                .bind(name.trim())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists != 0)
    }

    /// Lists every equipment name, unordered.
    pub async fn names(&self) -> DbResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>("SELECT name FROM equipment")
            .fetch_all(&self.pool)
            .await?;

        Ok(names)
    }

    /// Lists rows whose quantity is below their minimum stock level.
    ///
    /// Advisory only: nothing blocks a write that crosses the minimum.
    pub async fn list_below_min_stock(&self) -> DbResult<Vec<Equipment>> {
        let equipment = sqlx::query_as::<_, Equipment>(equipment_select!(
            "WHERE quantity < min_stock_level ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(equipment)
    }

    /// Counts equipment rows.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Creates one equipment row and its initial audit entry.
    ///
    /// The audit entry records `0 → quantity` with the same timestamp as the
    /// row's `last_updated`. `change_type` defaults to "Initial Creation".
    ///
    /// ## Returns
    /// * `Ok(Equipment)` - The stored row
    /// * `Err(DbError::Domain(Validation))` - Bad input, nothing written
    /// * `Err(DbError::UniqueViolation)` - Name already used (any case)
    pub async fn create(
        &self,
        input: NewEquipment,
        change_type: Option<&str>,
        notes: &str,
    ) -> DbResult<Equipment> {
        validate_new_equipment(&input)?;

        let change_type = change_type.unwrap_or(CHANGE_INITIAL_CREATION);
        let equipment = input.into_equipment(now_millis());

        debug!(name = %equipment.name, quantity = equipment.quantity, "Creating equipment");

        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin_unit().await?;

        let result = insert_with_audit(&mut *tx, &equipment, change_type, notes).await;
        finish(tx, result, "create").await?;

        info!(id = %equipment.id, name = %equipment.name, "Equipment created");
        Ok(equipment)
    }

    /// Creates many rows, each with its initial audit entry, as one unit.
    ///
    /// If any row fails (duplicate name, constraint, I/O) nothing from the
    /// batch is kept.
    pub async fn create_batch(
        &self,
        inputs: Vec<NewEquipment>,
        change_type: Option<&str>,
        notes: &str,
    ) -> DbResult<Vec<Equipment>> {
        for input in &inputs {
            validate_new_equipment(input)?;
        }

        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let change_type = change_type.unwrap_or(CHANGE_INITIAL_CREATION);
        let now = now_millis();
        let batch: Vec<Equipment> = inputs
            .into_iter()
            .map(|input| input.into_equipment(now))
            .collect();

        debug!(count = batch.len(), change_type, "Creating equipment batch");

        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin_unit().await?;

        let result = insert_all(&mut *tx, &batch, change_type, notes).await;
        finish(tx, result, "create_batch").await?;

        info!(count = batch.len(), "Equipment batch created");
        Ok(batch)
    }

    /// Writes parsed import rows as one unit, skipping names already stored.
    ///
    /// Existing names are read inside the unit, so a row created by another
    /// writer just before the import is counted as a duplicate instead of
    /// failing the batch.
    pub async fn import_rows(
        &self,
        parsed: ParsedImport,
        change_type: &str,
        notes: &str,
    ) -> DbResult<ImportSummary> {
        debug!(rows = parsed.rows.len(), change_type, "Importing equipment");

        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin_unit().await?;

        let result = plan_and_insert(&mut *tx, parsed, change_type, notes).await;
        finish(tx, result, "import").await
    }

    /// Adds `delta` to the freshly read quantity and records the change.
    ///
    /// ## Returns
    /// * `Ok(Equipment)` - The row after the change
    /// * `Err(Domain(ConcurrentDeletion))` - Row no longer exists
    /// * `Err(Domain(InsufficientQuantity))` - Result would be negative;
    ///   `available` is the fresh quantity
    /// * `Err(Domain(Validation))` - Zero delta or overflow
    pub async fn adjust_quantity(
        &self,
        id: &str,
        delta: i64,
        change_type: &str,
        notes: &str,
    ) -> DbResult<Equipment> {
        validate_delta(delta)?;
        self.change_quantity(id, QuantityChange::Delta(delta), change_type, notes)
            .await
    }

    /// Sets the quantity to `target` and records the change.
    ///
    /// Setting the current value again writes nothing and returns the row.
    pub async fn set_quantity(
        &self,
        id: &str,
        target: i64,
        change_type: &str,
        notes: &str,
    ) -> DbResult<Equipment> {
        validate_quantity(target)?;
        self.change_quantity(id, QuantityChange::Absolute(target), change_type, notes)
            .await
    }

    async fn change_quantity(
        &self,
        id: &str,
        change: QuantityChange,
        change_type: &str,
        notes: &str,
    ) -> DbResult<Equipment> {
        debug!(id = %id, ?change, change_type, "Adjusting quantity");

        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin_unit().await?;

        let result = guarded_change(&mut *tx, id, change, change_type, notes).await;
        let (equipment, recorded) = finish(tx, result, "adjust_quantity").await?;

        match recorded {
            Some(entry) => info!(
                id = %id,
                old = entry.old_quantity,
                new = entry.new_quantity,
                "Quantity adjusted"
            ),
            None => debug!(id = %id, "Quantity already at target"),
        }

        Ok(equipment)
    }

    /// Updates name, category and minimum stock level, stamping `last_updated`.
    ///
    /// Quantity is untouched, so no audit row is written.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No row with this id
    /// * `Err(DbError::UniqueViolation)` - New name already used (any case)
    pub async fn update_fields(&self, id: &str, update: EquipmentUpdate) -> DbResult<Equipment> {
        validate_equipment_update(&update)?;

        let name = update.name.trim().to_string();
        let category = update.category.trim().to_string();

        debug!(id = %id, name = %name, "Updating equipment fields");

        let _guard = self.write_lock.lock().await;

        let updated = sqlx::query_as::<_, Equipment>(
            r#"
            UPDATE equipment SET
                name = ?2,
                category = ?3,
                min_stock_level = ?4,
                last_updated = ?5
            WHERE id = ?1
            RETURNING id, name, quantity, COALESCE(category, '') AS category,
                      min_stock_level, last_updated
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(&category)
        .bind(update.min_stock_level)
        .bind(now_millis())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| with_name(e.into(), &name))?;

        updated.ok_or_else(|| DbError::not_found("Equipment", id))
    }

    /// Deletes a row; its audit entries go with it through the cascade.
    ///
    /// ## Returns
    /// * `Ok(u64)` - Number of audit entries removed alongside
    /// * `Err(DbError::NotFound)` - No row with this id
    pub async fn delete(&self, id: &str) -> DbResult<u64> {
        debug!(id = %id, "Deleting equipment");

        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin_unit().await?;

        let result = delete_in_unit(&mut *tx, id).await;
        let history_removed = finish(tx, result, "delete").await?;

        info!(id = %id, history_removed, "Equipment deleted");
        Ok(history_removed)
    }
}

// =============================================================================
// Write-Unit Steps
// =============================================================================

/// Commits on success; rolls back first and then returns the error unchanged.
async fn finish<T>(
    tx: sqlx::Transaction<'_, Sqlite>,
    result: DbResult<T>,
    operation: &'static str,
) -> DbResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            error!(operation, error = %err, "Write unit failed, rolling back");
            if let Err(rollback_err) = tx.rollback().await {
                warn!(operation, error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

async fn insert_with_audit(
    conn: &mut SqliteConnection,
    equipment: &Equipment,
    change_type: &str,
    notes: &str,
) -> DbResult<Transaction> {
    sqlx::query(
        r#"
        INSERT INTO equipment (id, name, quantity, category, min_stock_level, last_updated)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&equipment.id)
    .bind(&equipment.name)
    .bind(equipment.quantity)
    .bind(&equipment.category)
    .bind(equipment.min_stock_level)
    .bind(equipment.last_updated)
    .execute(&mut *conn)
    .await
    .map_err(|e| with_name(e.into(), &equipment.name))?;

    append_transaction(
        conn,
        Transaction {
            id: 0,
            equipment_id: equipment.id.clone(),
            timestamp: equipment.last_updated,
            change_type: change_type.to_string(),
            old_quantity: 0,
            new_quantity: equipment.quantity,
            notes: notes.to_string(),
        },
    )
    .await
}

async fn insert_all(
    conn: &mut SqliteConnection,
    batch: &[Equipment],
    change_type: &str,
    notes: &str,
) -> DbResult<()> {
    for equipment in batch {
        insert_with_audit(&mut *conn, equipment, change_type, notes).await?;
    }
    Ok(())
}

async fn plan_and_insert(
    conn: &mut SqliteConnection,
    parsed: ParsedImport,
    change_type: &str,
    notes: &str,
) -> DbResult<ImportSummary> {
    let existing = sqlx::query_scalar::<_, String>("SELECT name FROM equipment")
        .fetch_all(&mut *conn)
        .await?;
    let plan = plan_import(parsed, existing.iter().map(String::as_str));

    for input in &plan.accepted {
        validate_new_equipment(input)?;
    }

    let now = now_millis();
    let batch: Vec<Equipment> = plan
        .accepted
        .into_iter()
        .map(|input| input.into_equipment(now))
        .collect();
    insert_all(conn, &batch, change_type, notes).await?;

    Ok(plan.summary)
}

/// Re-fetch, check and write. The audit entry is `None` when an absolute
/// target equals the current quantity.
async fn guarded_change(
    conn: &mut SqliteConnection,
    id: &str,
    change: QuantityChange,
    change_type: &str,
    notes: &str,
) -> DbResult<(Equipment, Option<Transaction>)> {
    let mut current = sqlx::query_as::<_, Equipment>(equipment_select!("WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| CoreError::ConcurrentDeletion { id: id.to_string() })?;

    let new_quantity = match change {
        QuantityChange::Delta(delta) => apply_delta(current.quantity, delta)?,
        QuantityChange::Absolute(target) => target,
    };

    if new_quantity == current.quantity {
        return Ok((current, None));
    }

    if new_quantity < 0 {
        return Err(CoreError::InsufficientQuantity {
            name: current.name,
            available: current.quantity,
            requested: current.quantity.saturating_sub(new_quantity),
        }
        .into());
    }

    let now = now_millis();

    let updated = sqlx::query("UPDATE equipment SET quantity = ?2, last_updated = ?3 WHERE id = ?1")
        .bind(id)
        .bind(new_quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    if updated.rows_affected() == 0 {
        return Err(CoreError::ConcurrentDeletion { id: id.to_string() }.into());
    }

    let recorded = append_transaction(
        conn,
        Transaction {
            id: 0,
            equipment_id: id.to_string(),
            timestamp: now,
            change_type: change_type.to_string(),
            old_quantity: current.quantity,
            new_quantity,
            notes: notes.to_string(),
        },
    )
    .await?;

    current.quantity = new_quantity;
    current.last_updated = now;
    Ok((current, Some(recorded)))
}

async fn delete_in_unit(conn: &mut SqliteConnection, id: &str) -> DbResult<u64> {
    let history: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE equipment_id = ?1")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;

    let deleted = sqlx::query("DELETE FROM equipment WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(DbError::not_found("Equipment", id));
    }

    Ok(u64::try_from(history).unwrap_or_default())
}

/// Appends one audit row and returns it with its assigned id.
async fn append_transaction(
    conn: &mut SqliteConnection,
    mut entry: Transaction,
) -> DbResult<Transaction> {
    let result = sqlx::query(
        r#"
        INSERT INTO transactions
            (equipment_id, timestamp, change_type, old_quantity, new_quantity, notes)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&entry.equipment_id)
    .bind(entry.timestamp)
    .bind(&entry.change_type)
    .bind(entry.old_quantity)
    .bind(entry.new_quantity)
    .bind(&entry.notes)
    .execute(&mut *conn)
    .await?;

    entry.id = result.last_insert_rowid();
    Ok(entry)
}

/// Fills in the offending name on a unique violation.
fn with_name(err: DbError, name: &str) -> DbError {
    match err {
        DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
            field,
            value: name.to_string(),
        },
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use crate::DbError;
    use std::sync::Arc;
    use tracker_core::{CoreError, EquipmentUpdate, NewEquipment, CHANGE_MANUAL_UPDATE};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn history_pairs(db: &Database, id: &str) -> Vec<(i64, i64)> {
        db.history()
            .for_equipment(id)
            .await
            .unwrap()
            .iter()
            .map(|t| (t.old_quantity, t.new_quantity))
            .collect()
    }

    async fn fail_audit_inserts(db: &Database) {
        sqlx::query(
            r#"
            CREATE TRIGGER fail_audit BEFORE INSERT ON transactions
            BEGIN
                SELECT RAISE(ABORT, 'injected audit failure');
            END
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_records_initial_transaction() {
        let db = setup().await;
        let repo = db.equipment();

        let drill = repo
            .create(NewEquipment::new("Drill", 5).category("Tools"), None, "new stock")
            .await
            .unwrap();

        let history = db.history().for_equipment(&drill.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].change_type, "Initial Creation");
        assert_eq!(history[0].old_quantity, 0);
        assert_eq!(history[0].new_quantity, 5);
        assert_eq!(history[0].notes, "new stock");
        assert_eq!(history[0].timestamp, drill.last_updated);

        let stored = repo.get_by_id(&drill.id).await.unwrap().unwrap();
        assert_eq!(stored, drill);
    }

    #[tokio::test]
    async fn test_drill_scenario() {
        let db = setup().await;
        let repo = db.equipment();

        let drill = repo.create(NewEquipment::new("Drill", 5), None, "").await.unwrap();

        let drill = repo
            .adjust_quantity(&drill.id, 3, CHANGE_MANUAL_UPDATE, "")
            .await
            .unwrap();
        assert_eq!(drill.quantity, 8);

        let err = repo
            .adjust_quantity(&drill.id, -10, CHANGE_MANUAL_UPDATE, "")
            .await
            .unwrap_err();
        match err {
            DbError::Domain(CoreError::InsufficientQuantity {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 8);
                assert_eq!(requested, 10);
            }
            other => panic!("unexpected error: {other}"),
        }

        let drill = repo
            .adjust_quantity(&drill.id, -8, CHANGE_MANUAL_UPDATE, "")
            .await
            .unwrap();
        assert_eq!(drill.quantity, 0);

        assert_eq!(history_pairs(&db, &drill.id).await, vec![(0, 5), (5, 8), (8, 0)]);
    }

    #[tokio::test]
    async fn test_quantity_never_negative() {
        let db = setup().await;
        let repo = db.equipment();

        assert!(repo.create(NewEquipment::new("Saw", -1), None, "").await.is_err());
        assert_eq!(repo.count().await.unwrap(), 0);

        let saw = repo.create(NewEquipment::new("Saw", 0), None, "").await.unwrap();
        assert!(repo
            .adjust_quantity(&saw.id, -1, CHANGE_MANUAL_UPDATE, "")
            .await
            .is_err());
        assert!(repo
            .set_quantity(&saw.id, -4, CHANGE_MANUAL_UPDATE, "")
            .await
            .is_err());

        let saw = repo.get_by_id(&saw.id).await.unwrap().unwrap();
        assert_eq!(saw.quantity, 0);
        assert_eq!(db.history().count_for(&saw.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_zero_delta_rejected() {
        let db = setup().await;
        let repo = db.equipment();
        let saw = repo.create(NewEquipment::new("Saw", 2), None, "").await.unwrap();

        assert!(repo
            .adjust_quantity(&saw.id, 0, CHANGE_MANUAL_UPDATE, "")
            .await
            .is_err());
        assert_eq!(db.history().count_for(&saw.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_quantity_records_pair() {
        let db = setup().await;
        let repo = db.equipment();
        let tape = repo.create(NewEquipment::new("Tape", 4), None, "").await.unwrap();

        let tape = repo
            .set_quantity(&tape.id, 9, CHANGE_MANUAL_UPDATE, "recount")
            .await
            .unwrap();
        assert_eq!(tape.quantity, 9);

        // Same value again writes nothing.
        repo.set_quantity(&tape.id, 9, CHANGE_MANUAL_UPDATE, "")
            .await
            .unwrap();

        assert_eq!(history_pairs(&db, &tape.id).await, vec![(0, 4), (4, 9)]);
    }

    #[tokio::test]
    async fn test_delete_cascades_only_target() {
        let db = setup().await;
        let repo = db.equipment();

        let drill = repo.create(NewEquipment::new("Drill", 5), None, "").await.unwrap();
        let saw = repo.create(NewEquipment::new("Saw", 2), None, "").await.unwrap();
        repo.adjust_quantity(&drill.id, 1, CHANGE_MANUAL_UPDATE, "")
            .await
            .unwrap();
        repo.adjust_quantity(&saw.id, 1, CHANGE_MANUAL_UPDATE, "")
            .await
            .unwrap();

        let removed = repo.delete(&drill.id).await.unwrap();
        assert_eq!(removed, 2);

        assert!(repo.get_by_id(&drill.id).await.unwrap().is_none());
        assert_eq!(db.history().count_for(&drill.id).await.unwrap(), 0);
        assert_eq!(db.history().count_for(&saw.id).await.unwrap(), 2);
        assert_eq!(db.history().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let db = setup().await;
        let err = db.equipment().delete("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_adjust_deleted_reports_concurrent_deletion() {
        let db = setup().await;
        let repo = db.equipment();

        // Caller A holds a snapshot; caller B deletes the row.
        let snapshot = repo.create(NewEquipment::new("Drill", 5), None, "").await.unwrap();
        repo.delete(&snapshot.id).await.unwrap();

        let err = repo
            .adjust_quantity(&snapshot.id, 1, CHANGE_MANUAL_UPDATE, "")
            .await
            .unwrap_err();
        assert!(err.requires_refresh());
        assert!(matches!(
            err,
            DbError::Domain(CoreError::ConcurrentDeletion { .. })
        ));
        assert_eq!(db.history().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_rolls_back_when_audit_fails() {
        let db = setup().await;
        fail_audit_inserts(&db).await;
        let repo = db.equipment();

        assert!(repo.create(NewEquipment::new("Drill", 5), None, "").await.is_err());

        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(!repo.name_exists("Drill").await.unwrap());
    }

    #[tokio::test]
    async fn test_adjust_rolls_back_when_audit_fails() {
        let db = setup().await;
        let repo = db.equipment();
        let drill = repo.create(NewEquipment::new("Drill", 5), None, "").await.unwrap();

        fail_audit_inserts(&db).await;

        assert!(repo
            .adjust_quantity(&drill.id, 3, CHANGE_MANUAL_UPDATE, "")
            .await
            .is_err());

        let stored = repo.get_by_id(&drill.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 5);
        assert_eq!(stored.last_updated, drill.last_updated);
        assert_eq!(history_pairs(&db, &drill.id).await, vec![(0, 5)]);
    }

    #[tokio::test]
    async fn test_batch_rolls_back_whole_unit() {
        let db = setup().await;
        let repo = db.equipment();

        let err = repo
            .create_batch(
                vec![
                    NewEquipment::new("Hammer", 1),
                    NewEquipment::new("Level", 2),
                    NewEquipment::new("hammer", 3),
                ],
                None,
                "",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        assert_eq!(repo.count().await.unwrap(), 0);
        assert_eq!(db.history().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected_case_insensitively() {
        let db = setup().await;
        let repo = db.equipment();
        repo.create(NewEquipment::new("Drill", 5), None, "").await.unwrap();

        assert!(repo.name_exists("drill").await.unwrap());
        assert!(repo.name_exists("  DRILL ").await.unwrap());

        let err = repo
            .create(NewEquipment::new("DRILL", 1), None, "")
            .await
            .unwrap_err();
        match err {
            DbError::UniqueViolation { value, .. } => assert_eq!(value, "DRILL"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(db.history().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_fields_writes_no_history() {
        let db = setup().await;
        let repo = db.equipment();
        let drill = repo.create(NewEquipment::new("Drill", 5), None, "").await.unwrap();

        let mut update = EquipmentUpdate::from(&drill);
        update.name = "Hammer Drill".to_string();
        update.category = "Power Tools".to_string();
        update.min_stock_level = 2;

        let updated = repo.update_fields(&drill.id, update).await.unwrap();
        assert_eq!(updated.name, "Hammer Drill");
        assert_eq!(updated.category, "Power Tools");
        assert_eq!(updated.min_stock_level, 2);
        assert_eq!(updated.quantity, 5);
        assert!(updated.last_updated >= drill.last_updated);

        assert_eq!(db.history().count_for(&drill.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_fields_missing_is_not_found() {
        let db = setup().await;
        let update = EquipmentUpdate {
            name: "Ghost".to_string(),
            category: String::new(),
            min_stock_level: 0,
        };

        let err = db.equipment().update_fields("missing", update).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_rename_onto_existing_name_rejected() {
        let db = setup().await;
        let repo = db.equipment();
        repo.create(NewEquipment::new("Drill", 5), None, "").await.unwrap();
        let saw = repo.create(NewEquipment::new("Saw", 2), None, "").await.unwrap();

        let mut update = EquipmentUpdate::from(&saw);
        update.name = "drill".to_string();
        update.min_stock_level = 7;

        let err = repo.update_fields(&saw.id, update).await.unwrap_err();
        match err {
            DbError::UniqueViolation { value, .. } => assert_eq!(value, "drill"),
            other => panic!("unexpected error: {other}"),
        }

        let stored = repo.get_by_id(&saw.id).await.unwrap().unwrap();
        assert_eq!(stored, saw);

        let mut names = repo.names().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["Drill".to_string(), "Saw".to_string()]);
    }

    #[tokio::test]
    async fn test_list_below_min_stock() {
        let db = setup().await;
        let repo = db.equipment();
        repo.create(NewEquipment::new("Gloves", 1).min_stock_level(5), None, "")
            .await
            .unwrap();
        repo.create(NewEquipment::new("Helmet", 9).min_stock_level(5), None, "")
            .await
            .unwrap();

        let low = repo.list_below_min_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Gloves");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adjusters_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("equipment.db")))
            .await
            .unwrap();
        let drill = db
            .equipment()
            .create(NewEquipment::new("Drill", 5), None, "")
            .await
            .unwrap();
        let id = Arc::new(drill.id);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let repo = db.equipment();
            let id = Arc::clone(&id);
            handles.push(tokio::spawn(async move {
                repo.adjust_quantity(&id, -1, CHANGE_MANUAL_UPDATE, "checkout")
                    .await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(DbError::Domain(CoreError::InsufficientQuantity { available, .. })) => {
                    assert_eq!(available, 0)
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(succeeded, 5);
        let stored = db.equipment().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 0);
        assert_eq!(db.history().count_for(&id).await.unwrap(), 6);

        db.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_writers_on_two_handles_wait_for_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("equipment.db");
        let first = Database::new(DbConfig::new(path.clone())).await.unwrap();
        let second = Database::new(DbConfig::new(path)).await.unwrap();

        let drill = first
            .equipment()
            .create(NewEquipment::new("Drill", 40), None, "")
            .await
            .unwrap();
        let id = Arc::new(drill.id);

        let mut handles = Vec::new();
        for i in 0..40 {
            let repo = if i % 2 == 0 {
                first.equipment()
            } else {
                second.equipment()
            };
            let id = Arc::clone(&id);
            handles.push(tokio::spawn(async move {
                repo.adjust_quantity(&id, -1, CHANGE_MANUAL_UPDATE, "checkout")
                    .await
            }));
        }

        for handle in handles {
            if let Err(err) = handle.await.unwrap() {
                panic!("writer failed instead of waiting: {err}");
            }
        }

        let stored = second.equipment().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 0);
        assert_eq!(first.history().count_for(&id).await.unwrap(), 41);

        first.close().await;
        second.close().await;
    }
}
