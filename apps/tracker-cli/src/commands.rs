//! # Command Handlers
//!
//! One function per subcommand. Each resolves its arguments, calls the store
//! and prints the result; none of them carries a rule of its own.
//!
//! Output goes to the writer passed in, so handlers are testable without a
//! terminal.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;
use tracker_core::export::{write_equipment, write_history};
use tracker_core::validation::validate_equipment_id;
use tracker_core::{
    now_millis, Equipment, EquipmentUpdate, HistoryEntry, HistoryQuery, NewEquipment, Transaction,
};
use tracker_db::Database;

use crate::cli::{Command, ExportKind};
use crate::error::{CliError, CliResult};

/// Default history window when `--from` is omitted.
const DEFAULT_HISTORY_DAYS: i64 = 30;

/// Where and how handlers print.
pub struct Output<'a> {
    pub out: &'a mut dyn Write,
    pub json: bool,
}

impl Output<'_> {
    fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> CliResult<()> {
        serde_json::to_writer_pretty(&mut *self.out, value)?;
        writeln!(self.out)?;
        Ok(())
    }
}

/// Runs one subcommand against an open database.
pub async fn run(command: Command, db: &Database, output: &mut Output<'_>) -> CliResult<()> {
    if let Some(id) = command_id(&command) {
        validate_equipment_id(id)?;
    }

    match command {
        Command::Init => {
            db.initialize().await?;
            writeln!(output.out, "Database ready")?;
            Ok(())
        }
        Command::List { low } => list(db, low, output).await,
        Command::Show { id } => show(db, &id, output).await,
        Command::Add {
            name,
            quantity,
            category,
            min_stock,
            notes,
        } => {
            let input = NewEquipment::new(name, quantity)
                .category(category)
                .min_stock_level(min_stock);
            let created = db.equipment().create(input, None, &notes).await?;
            print_item(&created, "Added", output)
        }
        Command::Adjust {
            id,
            delta,
            change_type,
            notes,
        } => {
            let updated = db
                .equipment()
                .adjust_quantity(&id, delta, &change_type, &notes)
                .await?;
            print_item(&updated, "Adjusted", output)
        }
        Command::Set {
            id,
            quantity,
            change_type,
            notes,
        } => {
            let updated = db
                .equipment()
                .set_quantity(&id, quantity, &change_type, &notes)
                .await?;
            print_item(&updated, "Set", output)
        }
        Command::Edit {
            id,
            name,
            category,
            min_stock,
        } => edit(db, &id, name, category, min_stock, output).await,
        Command::Delete { id } => {
            let history_removed = db.equipment().delete(&id).await?;
            writeln!(
                output.out,
                "Deleted {} ({} history entries removed)",
                id, history_removed
            )?;
            Ok(())
        }
        Command::History { search, from, to } => {
            let query = history_query(search, from.as_deref(), to.as_deref(), now_millis())?;
            history(db, &query, output).await
        }
        Command::Import { file } => import(db, &file, output).await,
        Command::Export { what, out } => match out {
            Some(path) => {
                let file = File::create(&path)?;
                export(db, what, file).await?;
                writeln!(output.out, "Wrote {}", path.display())?;
                Ok(())
            }
            None => export(db, what, &mut *output.out).await,
        },
    }
}

/// The equipment id a command targets, if any.
fn command_id(command: &Command) -> Option<&str> {
    match command {
        Command::Show { id }
        | Command::Adjust { id, .. }
        | Command::Set { id, .. }
        | Command::Edit { id, .. }
        | Command::Delete { id } => Some(id.as_str()),
        _ => None,
    }
}

async fn list(db: &Database, low: bool, output: &mut Output<'_>) -> CliResult<()> {
    let items = if low {
        db.equipment().list_below_min_stock().await?
    } else {
        db.equipment().list_all().await?
    };

    if output.json {
        return output.write_json(&items);
    }

    writeln!(
        output.out,
        "{:<36}  {:<30}  {:>8}  {:>5}  {}",
        "ID", "NAME", "QTY", "MIN", "CATEGORY"
    )?;
    for eq in &items {
        let flag = if eq.is_below_min_stock() { " (low)" } else { "" };
        writeln!(
            output.out,
            "{:<36}  {:<30}  {:>8}  {:>5}  {}{}",
            eq.id, eq.name, eq.quantity, eq.min_stock_level, eq.category, flag
        )?;
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemWithHistory<'a> {
    equipment: &'a Equipment,
    history: &'a [Transaction],
}

async fn show(db: &Database, id: &str, output: &mut Output<'_>) -> CliResult<()> {
    let equipment = db
        .equipment()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CliError::not_found("Equipment", id))?;
    let history = db.history().for_equipment(id).await?;

    if output.json {
        return output.write_json(&ItemWithHistory {
            equipment: &equipment,
            history: &history,
        });
    }

    writeln!(output.out, "{} ({})", equipment.name, equipment.id)?;
    writeln!(output.out, "  quantity:   {}", equipment.quantity)?;
    writeln!(output.out, "  min stock:  {}", equipment.min_stock_level)?;
    writeln!(output.out, "  category:   {}", equipment.category)?;
    writeln!(output.out, "  updated:    {}", equipment.last_updated)?;
    writeln!(output.out, "History:")?;
    for t in &history {
        writeln!(
            output.out,
            "  {}  {:<18} {:>6} -> {:<6} {}",
            t.timestamp, t.change_type, t.old_quantity, t.new_quantity, t.notes
        )?;
    }
    Ok(())
}

async fn edit(
    db: &Database,
    id: &str,
    name: Option<String>,
    category: Option<String>,
    min_stock: Option<i64>,
    output: &mut Output<'_>,
) -> CliResult<()> {
    if name.is_none() && category.is_none() && min_stock.is_none() {
        return Err(CliError::validation(
            "Nothing to change: pass --name, --category or --min-stock",
        ));
    }

    let current = db
        .equipment()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CliError::not_found("Equipment", id))?;

    let mut update = EquipmentUpdate::from(&current);
    if let Some(name) = name {
        update.name = name;
    }
    if let Some(category) = category {
        update.category = category;
    }
    if let Some(min_stock) = min_stock {
        update.min_stock_level = min_stock;
    }

    let updated = db.equipment().update_fields(id, update).await?;
    print_item(&updated, "Updated", output)
}

async fn history(db: &Database, query: &HistoryQuery, output: &mut Output<'_>) -> CliResult<()> {
    let entries: Vec<HistoryEntry> = db.history().search(query).await?;

    if output.json {
        return output.write_json(&entries);
    }

    for entry in &entries {
        let t = &entry.transaction;
        writeln!(
            output.out,
            "{}  {:<30} {:<18} {:>6} -> {:<6} {}",
            t.timestamp, entry.equipment_name, t.change_type, t.old_quantity, t.new_quantity, t.notes
        )?;
    }
    writeln!(output.out, "{} entries", entries.len())?;
    Ok(())
}

async fn import(db: &Database, file: &Path, output: &mut Output<'_>) -> CliResult<()> {
    let label = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());
    let reader = BufReader::new(File::open(file)?);

    let summary = db.importer().import_csv(reader, &label).await?;
    info!(file = %file.display(), added = summary.added, "Import complete");

    if output.json {
        return output.write_json(&summary);
    }

    writeln!(
        output.out,
        "Added {}, skipped {} duplicate(s), skipped {} invalid row(s)",
        summary.added, summary.skipped_duplicates, summary.skipped_invalid
    )?;
    Ok(())
}

async fn export<W: Write>(db: &Database, what: ExportKind, out: W) -> CliResult<()> {
    match what {
        ExportKind::Equipment => {
            let items = db.equipment().list_all().await?;
            write_equipment(out, &items)?;
        }
        ExportKind::History => {
            let query = history_query(None, Some("1970-01-01"), None, now_millis())?;
            let entries = db.history().search(&query).await?;
            write_history(out, &entries)?;
        }
    }
    Ok(())
}

fn print_item(eq: &Equipment, verb: &str, output: &mut Output<'_>) -> CliResult<()> {
    if output.json {
        return output.write_json(eq);
    }
    writeln!(
        output.out,
        "{} {} ({}): quantity {}",
        verb, eq.name, eq.id, eq.quantity
    )?;
    Ok(())
}

/// Builds a history query from optional textual bounds.
///
/// Date-only bounds cover whole days: `--from` starts at midnight and `--to`
/// ends at the last millisecond of the day.
fn history_query(
    search: Option<String>,
    from: Option<&str>,
    to: Option<&str>,
    now: DateTime<Utc>,
) -> CliResult<HistoryQuery> {
    let start = match from {
        Some(raw) => parse_bound(raw, false)?,
        None => now - Duration::days(DEFAULT_HISTORY_DAYS),
    };
    let end = match to {
        Some(raw) => parse_bound(raw, true)?,
        None => now,
    };

    let mut query = HistoryQuery::between(start, end);
    if let Some(term) = search {
        query = query.matching(term);
    }
    query.validate()?;
    Ok(query)
}

fn parse_bound(raw: &str, end_of_day: bool) -> CliResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| CliError::validation(format!("Invalid date '{}': use YYYY-MM-DD", raw)))?;
    let time = if end_of_day {
        date.and_hms_milli_opt(23, 59, 59, 999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };

    time.map(|t| t.and_utc())
        .ok_or_else(|| CliError::validation(format!("Invalid date '{}'", raw)))
}
