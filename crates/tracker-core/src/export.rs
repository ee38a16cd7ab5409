//! # Export Framing
//!
//! Serializes listings and history to delimited text.
//!
//! Fields containing the delimiter, a quote or a line break are quoted and
//! inner quotes are doubled; everything else is written bare.

use std::io::Write;

use chrono::SecondsFormat;

use crate::types::{Equipment, HistoryEntry};

/// Header written before equipment rows.
pub const EQUIPMENT_HEADER: [&str; 6] = [
    "Id",
    "Name",
    "Quantity",
    "Category",
    "MinStockLevel",
    "LastUpdated",
];

/// Header written before history rows.
pub const HISTORY_HEADER: [&str; 7] = [
    "Id",
    "Timestamp",
    "Equipment",
    "ChangeType",
    "OldQuantity",
    "NewQuantity",
    "Notes",
];

/// Writes an equipment listing with a header row.
pub fn write_equipment<W: Write>(out: W, items: &[Equipment]) -> csv::Result<()> {
    let mut writer = writer(out);
    writer.write_record(EQUIPMENT_HEADER)?;

    for eq in items {
        let quantity = eq.quantity.to_string();
        let min_stock = eq.min_stock_level.to_string();
        let last_updated = eq.last_updated.to_rfc3339_opts(SecondsFormat::Millis, true);
        writer.write_record([
            eq.id.as_str(),
            eq.name.as_str(),
            quantity.as_str(),
            eq.category.as_str(),
            min_stock.as_str(),
            last_updated.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes history entries with a header row, in the order given.
pub fn write_history<W: Write>(out: W, entries: &[HistoryEntry]) -> csv::Result<()> {
    let mut writer = writer(out);
    writer.write_record(HISTORY_HEADER)?;

    for entry in entries {
        let tx = &entry.transaction;
        let id = tx.id.to_string();
        let timestamp = tx.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        let old_quantity = tx.old_quantity.to_string();
        let new_quantity = tx.new_quantity.to_string();
        writer.write_record([
            id.as_str(),
            timestamp.as_str(),
            entry.equipment_name.as_str(),
            tx.change_type.as_str(),
            old_quantity.as_str(),
            new_quantity.as_str(),
            tx.notes.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Equipment listing as a `String`.
///
/// ```rust
/// use tracker_core::export::equipment_to_csv;
/// use tracker_core::{now_millis, NewEquipment};
///
/// let saw = NewEquipment::new("Saw, \"big\"", 2).into_equipment(now_millis());
/// let drill = NewEquipment::new("Drill", 5).into_equipment(now_millis());
///
/// let text = equipment_to_csv(&[saw, drill]).unwrap();
/// assert!(text.contains(",\"Saw, \"\"big\"\"\",2,"));
/// assert!(text.contains(",Drill,5,"));
/// ```
pub fn equipment_to_csv(items: &[Equipment]) -> csv::Result<String> {
    let mut buf = Vec::new();
    write_equipment(&mut buf, items)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// History entries as a `String`.
pub fn history_to_csv(entries: &[HistoryEntry]) -> csv::Result<String> {
    let mut buf = Vec::new();
    write_history(&mut buf, entries)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::CRLF)
        .from_writer(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{now_millis, NewEquipment, Transaction};

    #[test]
    fn test_equipment_to_csv_quotes_when_needed() {
        let eq = NewEquipment::new("Saw, circular", 3)
            .category("Power \"Tools\"")
            .into_equipment(now_millis());

        let text = equipment_to_csv(&[eq.clone()]).unwrap();
        let mut lines = text.split("\r\n");

        assert_eq!(
            lines.next(),
            Some("Id,Name,Quantity,Category,MinStockLevel,LastUpdated")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with(&eq.id));
        assert!(row.contains(",\"Saw, circular\",3,\"Power \"\"Tools\"\"\",0,"));
    }

    #[test]
    fn test_history_to_csv_keeps_order() {
        let ts = now_millis();
        let entry = |id: i64, notes: &str| HistoryEntry {
            transaction: Transaction {
                id,
                equipment_id: "e1".to_string(),
                timestamp: ts,
                change_type: "Manual Update".to_string(),
                old_quantity: 0,
                new_quantity: 1,
                notes: notes.to_string(),
            },
            equipment_name: "Drill".to_string(),
        };

        let text = history_to_csv(&[entry(2, "second"), entry(1, "line\nbreak")]).unwrap();
        let body: Vec<_> = text.split("\r\n").skip(1).collect();

        assert!(body[0].starts_with("2,"));
        assert!(body[1].starts_with("1,"));
        assert!(body[1].ends_with(",\"line\nbreak\""));
    }
}
