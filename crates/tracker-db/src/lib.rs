//! # tracker-db: Storage Layer for the Equipment Tracker
//!
//! SQLite persistence for equipment and its audit trail, using sqlx for
//! async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Equipment Tracker Data Flow                         │
//! │                                                                         │
//! │  CLI command (tracker adjust <id> -2)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tracker-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │   Schema     │  │   │
//! │  │   │   (pool.rs)   │    │                │    │ (schema.rs)  │  │   │
//! │  │   │               │    │ EquipmentRepo  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ HistoryRepo    │    │ equipment    │  │   │
//! │  │   │ WriteLock     │    │ Importer       │    │ transactions │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/equipment-tracker/equipment.db                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, configuration and the single-writer lock
//! - [`schema`] - Idempotent table creation
//! - [`error`] - Database error types
//! - [`repository`] - Equipment and history repositories
//! - [`import`] - Bulk import through the write protocol
//! - [`cache`] - Read-through listing cache
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tracker_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/equipment.db")).await?;
//!
//! let drill = db.equipment().create(NewEquipment::new("Drill", 5), None, "").await?;
//! let recent = db.history().search(&HistoryQuery::between(start, end)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod error;
pub mod import;
pub mod pool;
pub mod repository;
pub mod schema;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::EquipmentCache;
pub use error::{DbError, DbResult};
pub use import::Importer;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::equipment::EquipmentRepository;
pub use repository::history::HistoryRepository;
