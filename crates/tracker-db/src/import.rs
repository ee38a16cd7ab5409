//! # Bulk Import
//!
//! Writes a parsed import file through the equipment write protocol.
//!
//! ```text
//! file ──► parse_import ──► EquipmentRepository::import_rows
//!                            ├── read existing names  ┐
//!                            ├── plan_import          │ one atomic unit
//!                            └── insert + audit rows  ┘
//! ```
//!
//! Every accepted row gets its own "CSV Import" audit entry. If any row
//! fails at write time the whole batch is rolled back.

use std::io::Read;

use tracing::{info, warn};

use crate::error::DbResult;
use crate::repository::equipment::EquipmentRepository;
use tracker_core::import::{parse_import, ParsedImport};
use tracker_core::{ImportSummary, CHANGE_CSV_IMPORT};

/// Bulk importer writing through an [`EquipmentRepository`].
#[derive(Debug, Clone)]
pub struct Importer {
    equipment: EquipmentRepository,
}

impl Importer {
    /// Creates a new Importer.
    pub fn new(equipment: EquipmentRepository) -> Self {
        Importer { equipment }
    }

    /// Imports delimited text. `source_label` (usually the file name) is
    /// recorded in every audit entry's notes.
    ///
    /// ## Returns
    /// * `Ok(ImportSummary)` - Counts of added and skipped rows
    /// * `Err(_)` - The batch failed and nothing was written
    pub async fn import_csv<R: Read>(&self, input: R, source_label: &str) -> DbResult<ImportSummary> {
        let parsed = parse_import(input);
        self.import_parsed(parsed, source_label).await
    }

    /// Writes already-parsed rows, skipping names that exist (any case).
    pub async fn import_parsed(
        &self,
        parsed: ParsedImport,
        source_label: &str,
    ) -> DbResult<ImportSummary> {
        if parsed.malformed > 0 {
            warn!(
                malformed = parsed.malformed,
                source = source_label,
                "Skipped malformed import rows"
            );
        }

        let notes = format!("Imported from {source_label}");
        let summary = self
            .equipment
            .import_rows(parsed, CHANGE_CSV_IMPORT, &notes)
            .await?;

        info!(
            source = source_label,
            added = summary.added,
            skipped_duplicates = summary.skipped_duplicates,
            skipped_invalid = summary.skipped_invalid,
            "Import finished"
        );
        Ok(summary)
    }
}
