//! # Equipment Listing Cache
//!
//! A read-through copy of `list_all` for views that redraw often.
//!
//! ```text
//! list() ──► cached? ──yes──► clone of snapshot
//!               │
//!               no ──► EquipmentRepository::list_all ──► store snapshot
//!
//! create / adjust / set / update / delete / import ──► repository ──► invalidate
//! ```
//!
//! The cache is for display only. Writes never consult it: the concurrency
//! guard always re-reads the row inside the write unit.

use std::io::Read;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::DbResult;
use crate::import::Importer;
use crate::repository::equipment::EquipmentRepository;
use tracker_core::{Equipment, EquipmentUpdate, ImportSummary, NewEquipment};

/// Listing cache invalidated by every write made through it.
///
/// Clones share the same snapshot.
#[derive(Debug, Clone)]
pub struct EquipmentCache {
    equipment: EquipmentRepository,
    snapshot: Arc<RwLock<Option<Vec<Equipment>>>>,
}

impl EquipmentCache {
    /// Creates an empty cache over a repository.
    pub fn new(equipment: EquipmentRepository) -> Self {
        EquipmentCache {
            equipment,
            snapshot: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the listing, loading it on first use or after invalidation.
    pub async fn list(&self) -> DbResult<Vec<Equipment>> {
        if let Some(cached) = self.snapshot.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let mut guard = self.snapshot.write().await;
        // Another caller may have loaded it while we waited.
        if let Some(cached) = guard.as_ref() {
            return Ok(cached.clone());
        }

        let fresh = self.equipment.list_all().await?;
        debug!(count = fresh.len(), "Equipment cache loaded");
        *guard = Some(fresh.clone());
        Ok(fresh)
    }

    /// Drops the snapshot; the next `list` reloads from the store.
    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
        debug!("Equipment cache invalidated");
    }

    /// Returns true if a snapshot is held.
    pub async fn is_loaded(&self) -> bool {
        self.snapshot.read().await.is_some()
    }

    /// See [`EquipmentRepository::create`].
    pub async fn create(
        &self,
        input: NewEquipment,
        change_type: Option<&str>,
        notes: &str,
    ) -> DbResult<Equipment> {
        let result = self.equipment.create(input, change_type, notes).await;
        self.invalidate().await;
        result
    }

    /// See [`EquipmentRepository::adjust_quantity`].
    pub async fn adjust_quantity(
        &self,
        id: &str,
        delta: i64,
        change_type: &str,
        notes: &str,
    ) -> DbResult<Equipment> {
        let result = self
            .equipment
            .adjust_quantity(id, delta, change_type, notes)
            .await;
        self.invalidate().await;
        result
    }

    /// See [`EquipmentRepository::set_quantity`].
    pub async fn set_quantity(
        &self,
        id: &str,
        target: i64,
        change_type: &str,
        notes: &str,
    ) -> DbResult<Equipment> {
        let result = self
            .equipment
            .set_quantity(id, target, change_type, notes)
            .await;
        self.invalidate().await;
        result
    }

    /// See [`EquipmentRepository::update_fields`].
    pub async fn update_fields(&self, id: &str, update: EquipmentUpdate) -> DbResult<Equipment> {
        let result = self.equipment.update_fields(id, update).await;
        self.invalidate().await;
        result
    }

    /// See [`EquipmentRepository::delete`].
    pub async fn delete(&self, id: &str) -> DbResult<u64> {
        let result = self.equipment.delete(id).await;
        self.invalidate().await;
        result
    }

    /// See [`Importer::import_csv`].
    pub async fn import_csv<R: Read>(&self, input: R, source_label: &str) -> DbResult<ImportSummary> {
        let result = Importer::new(self.equipment.clone())
            .import_csv(input, source_label)
            .await;
        self.invalidate().await;
        result
    }
}
