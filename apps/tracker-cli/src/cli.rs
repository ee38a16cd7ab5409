//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracker_core::CHANGE_MANUAL_UPDATE;

/// Track equipment stock with a full audit trail.
#[derive(Debug, Parser)]
#[command(name = "tracker", version, about)]
pub struct Cli {
    /// Path to the database file
    #[arg(long, global = true, env = "TRACKER_DB_PATH")]
    pub db: Option<PathBuf>,

    /// Maximum pooled connections
    #[arg(long, global = true, env = "TRACKER_MAX_CONNECTIONS")]
    pub max_connections: Option<u32>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the database and its tables if missing
    Init,

    /// List equipment
    List {
        /// Only items below their minimum stock level
        #[arg(long)]
        low: bool,
    },

    /// Show one item and its history
    Show {
        /// Equipment id
        id: String,
    },

    /// Add a new item
    Add {
        name: String,
        quantity: i64,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value_t = 0)]
        min_stock: i64,
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Add to (or, with a negative number, take from) an item's stock
    Adjust {
        id: String,
        #[arg(allow_negative_numbers = true)]
        delta: i64,
        #[arg(long, default_value = CHANGE_MANUAL_UPDATE)]
        change_type: String,
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Set an item's stock to an exact count
    Set {
        id: String,
        quantity: i64,
        #[arg(long, default_value = CHANGE_MANUAL_UPDATE)]
        change_type: String,
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Change name, category or minimum stock (no history entry)
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        min_stock: Option<i64>,
    },

    /// Delete an item and its history
    Delete { id: String },

    /// Search history
    History {
        /// Text matched against name, change type and notes
        #[arg(long)]
        search: Option<String>,
        /// Window start (YYYY-MM-DD or RFC 3339); default 30 days ago
        #[arg(long)]
        from: Option<String>,
        /// Window end (YYYY-MM-DD or RFC 3339); default now
        #[arg(long)]
        to: Option<String>,
    },

    /// Import items from a CSV file (name,quantity[,category[,min_stock]])
    Import { file: PathBuf },

    /// Export a listing or history as CSV
    Export {
        #[arg(value_enum)]
        what: ExportKind,
        /// Output file; stdout when omitted
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    Equipment,
    History,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_negative_delta_parses() {
        let cli = Cli::try_parse_from(["tracker", "adjust", "abc", "-3"]).unwrap();
        match cli.command {
            Command::Adjust {
                delta, change_type, ..
            } => {
                assert_eq!(delta, -3);
                assert_eq!(change_type, "Manual Update");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["tracker", "list", "--low", "--json", "--db", "x.db"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        assert!(matches!(cli.command, Command::List { low: true }));
    }
}
