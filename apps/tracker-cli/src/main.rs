//! # tracker: Equipment Tracker Command Line
//!
//! Thin shell over the store: resolve configuration, start logging, open the
//! database and hand the parsed subcommand to its handler.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       CLI Startup                                       │
//! │                                                                         │
//! │  1. Initialize Logging ──────── RUST_LOG or the default filter          │
//! │  2. Parse Arguments ─────────── clap (flags fall back to TRACKER_*)     │
//! │  3. Resolve Configuration ───── flag → env → platform data dir          │
//! │  4. Open Database ───────────── create file + schema on first run       │
//! │  5. Run Command ─────────────── print result or error, set exit code    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cli;
mod commands;
mod config;
mod error;

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracker_db::Database;

use cli::Cli;
use commands::Output;
use config::AppConfig;
use error::CliResult;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let json = cli.json;

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json {
                if let Ok(body) = serde_json::to_string_pretty(&err) {
                    eprintln!("{body}");
                }
            } else {
                eprintln!("error: {}", err.message);
            }
            ExitCode::from(err.code.exit_code())
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = AppConfig::resolve(cli.db, cli.max_connections)?;
    config.ensure_data_dir()?;
    debug!(path = %config.display_path().display(), "Using database");

    let db = Database::new(config.db_config()).await?;

    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    let mut output = Output {
        out: &mut lock,
        json: cli.json,
    };

    let result = commands::run(cli.command, &db, &mut output).await;
    lock.flush()?;
    db.close().await;
    result
}

/// Initializes the tracing subscriber for logging.
///
/// Logs go to stderr so command output on stdout stays clean.
///
/// ## Log Levels
/// - `ERROR`: Failed write units (already rolled back)
/// - `WARN`: Skipped import rows
/// - `INFO`: Completed writes, database lifecycle
/// - `DEBUG`: Query details
///
/// ## Environment Variable
/// Set `RUST_LOG` to control logging:
/// ```bash
/// RUST_LOG=debug tracker list         # All debug logs
/// RUST_LOG=tracker_db=debug tracker list
/// ```
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,tracker=info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
