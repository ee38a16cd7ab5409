//! # Import Parsing
//!
//! Turns a delimited text file into equipment rows ready for a batch write.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Import Pipeline                                   │
//! │                                                                         │
//! │  name,quantity,category,min_stock      ← header, always skipped        │
//! │  Drill,5,Tools,2                                                       │
//! │  "Saw, circular",3                     ← quoted delimiter is fine      │
//! │  Ladder                                ← short row: malformed          │
//! │  drill,1                               ← duplicate of "Drill"          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  parse_import() → ParsedImport { rows, malformed, invalid }            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  plan_import(parsed, existing names) → ImportPlan                      │
//! │       │   accepted: [Drill, Saw, circular]                             │
//! │       │   summary:  skipped_duplicates = 1                             │
//! │       ▼                                                                 │
//! │  tracker-db writes `accepted` as ONE atomic batch                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Column rules: quantity that does not parse becomes 0; category is
//! optional; minimum stock is optional and becomes 0 when it does not parse.
//! A negative quantity or minimum makes the row invalid.

use std::collections::HashSet;
use std::io::Read;

use crate::types::{ImportSummary, NewEquipment};
use crate::validation::validate_new_equipment;

/// A row that parsed and validated, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub line: u64,
    pub equipment: NewEquipment,
}

/// Result of parsing an import file, before duplicate detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedImport {
    pub rows: Vec<ImportRow>,
    /// Blank, short or undecodable records.
    pub malformed: usize,
    /// Records that parsed but failed validation.
    pub invalid: usize,
}

/// Rows to write plus the counts to report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportPlan {
    pub accepted: Vec<NewEquipment>,
    pub summary: ImportSummary,
}

/// Case-folded key used for duplicate detection.
///
/// ASCII-only folding matches SQLite's `NOCASE` collation on the name column,
/// so a name the importer accepts is never rejected by the schema as a duplicate.
pub fn name_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Parses delimited text into equipment rows.
///
/// The first record is a header and is always skipped.
pub fn parse_import<R: Read>(input: R) -> ParsedImport {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut parsed = ParsedImport::default();

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(_) => {
                parsed.malformed += 1;
                continue;
            }
        };

        if record.len() < 2 || record.iter().all(str::is_empty) {
            parsed.malformed += 1;
            continue;
        }

        let equipment = NewEquipment {
            name: record.get(0).unwrap_or_default().to_string(),
            quantity: parse_int_or_zero(record.get(1)),
            category: record.get(2).unwrap_or_default().to_string(),
            min_stock_level: parse_int_or_zero(record.get(3)),
        };

        if validate_new_equipment(&equipment).is_err() {
            parsed.invalid += 1;
            continue;
        }

        let line = record.position().map(|p| p.line()).unwrap_or_default();
        parsed.rows.push(ImportRow { line, equipment });
    }

    parsed
}

/// Drops rows whose name matches an existing or earlier-queued name.
pub fn plan_import<'a, I>(parsed: ParsedImport, existing_names: I) -> ImportPlan
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashSet<String> = existing_names.into_iter().map(name_key).collect();
    let mut plan = ImportPlan {
        accepted: Vec::with_capacity(parsed.rows.len()),
        summary: ImportSummary {
            skipped_invalid: parsed.invalid,
            ..ImportSummary::default()
        },
    };

    for row in parsed.rows {
        if !seen.insert(name_key(&row.equipment.name)) {
            plan.summary.skipped_duplicates += 1;
            continue;
        }
        plan.accepted.push(row.equipment);
    }

    plan.summary.added = plan.accepted.len();
    plan
}

fn parse_int_or_zero(field: Option<&str>) -> i64 {
    field
        .map(|f| f.trim_matches('"'))
        .and_then(|f| f.parse().ok())
        .unwrap_or(0)
}
