//! # Database Pool Management
//!
//! Connection pool creation, configuration and the single-writer lock.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Store Engine                                       │
//! │                                                                         │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + initialize schema         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │  readers: any connection  │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │                           │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       ▲                                                                 │
//! │       │  writers: hold WriteLock for one atomic unit, then release     │
//! │  ┌────┴────────────┐                                                   │
//! │  │ WriteLock       │  tokio::sync::Mutex<()>, shared by repositories   │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL mode lets readers keep reading committed data while a write
//! unit is open, so a slow writer never blocks a listing or a search.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::EquipmentCache;
use crate::error::{DbError, DbResult};
use crate::import::Importer;
use crate::repository::equipment::EquipmentRepository;
use crate::repository::history::HistoryRepository;
use crate::schema;

/// Serializes write units within the process.
///
/// Held only for the duration of one atomic unit, never across caller
/// think-time.
pub(crate) type WriteLock = Arc<Mutex<()>>;

/// Opens every write unit.
///
/// Takes SQLite's file write lock at `BEGIN`, so a writer on another
/// connection or process waits out the busy timeout rather than failing
/// when it tries to upgrade a read snapshot.
pub(crate) const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/equipment.db")
///     .max_connections(5)
///     .busy_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// How long to wait for a pooled connection.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// How long SQLite waits on a locked database file before failing.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Whether to create the schema on connect.
    /// Default: true
    pub initialize_schema: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// ## Arguments
    /// * `path` - Path to the SQLite database file. Will be created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
            initialize_schema: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the file-lock wait.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets whether to create the schema on connect.
    pub fn initialize_schema(mut self, run: bool) -> Self {
        self.initialize_schema = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::in_memory()).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            busy_timeout: Duration::from_secs(1),
            initialize_schema: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone: clones share the pool and the write lock.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./equipment.db")).await?;
///
/// let drill = db.equipment().create(NewEquipment::new("Drill", 5), None, "").await?;
/// db.equipment().adjust_quantity(&drill.id, -2, "Manual Update", "site A").await?;
/// let history = db.history().for_equipment(&drill.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,

    /// Shared by every repository handed out by this database.
    write_lock: WriteLock,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous
    ///    - Foreign keys enabled (required for the history cascade)
    ///    - busy timeout for file-lock waits
    /// 3. Creates the connection pool
    /// 4. Creates the schema (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        // sqlite://path creates file if not exists
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // SQLite has them disabled by default; the cascade depends on it
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        };

        if config.initialize_schema {
            db.initialize().await?;
        }

        Ok(db)
    }

    /// Creates both tables if absent.
    ///
    /// Idempotent: safe to call on every startup, and more than once.
    pub async fn initialize(&self) -> DbResult<()> {
        let _guard = self.write_lock.lock().await;
        schema::initialize(&self.pool).await
    }

    /// Returns a reference to the connection pool.
    ///
    /// ## Usage
    /// For diagnostics and tests. Writes must go through the repositories,
    /// which hold the write lock.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the equipment repository (write protocol and current-state reads).
    pub fn equipment(&self) -> EquipmentRepository {
        EquipmentRepository::new(self.pool.clone(), self.write_lock.clone())
    }

    /// Returns the history repository (audit-log queries).
    pub fn history(&self) -> HistoryRepository {
        HistoryRepository::new(self.pool.clone())
    }

    /// Returns a bulk importer writing through the equipment repository.
    pub fn importer(&self) -> Importer {
        Importer::new(self.equipment())
    }

    /// Returns a read-through cache over the equipment listing.
    pub fn cache(&self) -> EquipmentCache {
        EquipmentCache::new(self.equipment())
    }

    /// Closes the database connection pool.
    ///
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .busy_timeout(Duration::from_millis(250));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(config.initialize_schema);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let before = schema::schema_objects(db.pool()).await.unwrap();

        db.initialize().await.unwrap();
        db.initialize().await.unwrap();

        let after = schema::schema_objects(db.pool()).await.unwrap();
        assert_eq!(before, after);

        let tables: Vec<_> = after
            .iter()
            .filter(|(kind, _)| kind == "table")
            .map(|(_, name)| name.as_str())
            .collect();
        assert_eq!(tables, vec!["equipment", "transactions"]);
    }

    #[tokio::test]
    async fn test_file_database_created_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("equipment.db");
        assert!(!path.exists());

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert!(path.exists());
        db.close().await;

        // Reopening an existing file runs initialization again without error.
        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert!(db.health_check().await);
        db.close().await;
    }

    #[tokio::test]
    async fn test_closed_pool_fails_health_check() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }
}
