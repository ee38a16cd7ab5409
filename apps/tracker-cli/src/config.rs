//! # Configuration
//!
//! Resolves where the database lives and how the pool is sized.
//!
//! ## Sources (Priority Order)
//! 1. `--db` / `--max-connections` flags
//! 2. Environment (`TRACKER_DB_PATH`, `TRACKER_MAX_CONNECTIONS`), read by clap
//! 3. Platform data directory (this file)
//!
//! ## Platform-Specific Paths
//! - **Linux**: `~/.local/share/equipment-tracker/equipment.db`
//! - **macOS**: `~/Library/Application Support/com.equipment-tracker.equipment-tracker/equipment.db`
//! - **Windows**: `%APPDATA%\equipment-tracker\equipment-tracker\data\equipment.db`

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracker_db::DbConfig;

use crate::error::{CliError, CliResult};

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "equipment.db";

/// Resolved application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Path to the SQLite file. Created on first run.
    pub database_path: PathBuf,

    /// Pool size override; the store default applies when `None`.
    pub max_connections: Option<u32>,
}

impl AppConfig {
    /// Builds the configuration from already-parsed flags.
    ///
    /// Falls back to the platform data directory when no path was given.
    pub fn resolve(database_path: Option<PathBuf>, max_connections: Option<u32>) -> CliResult<Self> {
        let database_path = match database_path {
            Some(path) => path,
            None => default_database_path()
                .ok_or_else(|| CliError::config("Could not determine app data directory"))?,
        };

        if max_connections == Some(0) {
            return Err(CliError::config("max connections must be at least 1"));
        }

        Ok(AppConfig {
            database_path,
            max_connections,
        })
    }

    /// Creates the parent directory of the database file if needed.
    pub fn ensure_data_dir(&self) -> CliResult<()> {
        if let Some(parent) = self.database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Store configuration for this application configuration.
    pub fn db_config(&self) -> DbConfig {
        let config = DbConfig::new(&self.database_path);
        match self.max_connections {
            Some(max) => config.max_connections(max).min_connections(1),
            None => config,
        }
    }

    /// Path shown to the user.
    pub fn display_path(&self) -> &Path {
        &self.database_path
    }
}

/// Default database location inside the platform data directory.
pub fn default_database_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "equipment-tracker", "equipment-tracker")
        .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let config = AppConfig::resolve(Some(PathBuf::from("/tmp/stock.db")), None).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/stock.db"));
        assert_eq!(config.db_config().max_connections, 5);
    }

    #[test]
    fn test_max_connections_override() {
        let config = AppConfig::resolve(Some(PathBuf::from("stock.db")), Some(2)).unwrap();
        assert_eq!(config.db_config().max_connections, 2);

        assert!(AppConfig::resolve(Some(PathBuf::from("stock.db")), Some(0)).is_err());
    }

    #[test]
    fn test_default_path_file_name() {
        if let Some(path) = default_database_path() {
            assert_eq!(path.file_name().unwrap(), DATABASE_FILE);
        }
    }

    #[test]
    fn test_ensure_data_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(DATABASE_FILE);
        let config = AppConfig::resolve(Some(path.clone()), None).unwrap();

        config.ensure_data_dir().unwrap();
        assert!(path.parent().unwrap().is_dir());
    }
}
