//! # tracker-core: Entity Model for the Equipment Tracker
//!
//! This crate holds the data shapes and pure rules of the inventory ledger.
//! It never touches the database; `tracker-db` owns every read and write.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Equipment Tracker Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tracker-cli (thin shell)                     │   │
//! │  │    add, adjust, edit, delete, history, import, export          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tracker-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ validation│  │  import   │  │  export   │  │   │
//! │  │   │ Equipment │  │   rules   │  │ CSV rows  │  │ CSV text  │  │   │
//! │  │   │Transaction│  │   checks  │  │  dedupe   │  │  quoting  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   tracker-db (Store Engine)                     │   │
//! │  │     schema, write protocol, history queries, concurrency       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Equipment, Transaction and query/input types
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation run before a write unit opens
//! - [`import`] - Parsing of delimited import files into rows
//! - [`export`] - Delimited export of listings and history
//!
//! ## Example Usage
//!
//! ```rust
//! use tracker_core::validation::validate_equipment_name;
//!
//! assert!(validate_equipment_name("Drill").is_ok());
//! assert!(validate_equipment_name("   ").is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod export;
pub mod import;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Change type recorded when an item is first created.
pub const CHANGE_INITIAL_CREATION: &str = "Initial Creation";

/// Change type recorded for an interactive quantity adjustment.
pub const CHANGE_MANUAL_UPDATE: &str = "Manual Update";

/// Change type recorded for rows created by a bulk import.
pub const CHANGE_CSV_IMPORT: &str = "CSV Import";

/// Maximum length of an equipment name, in characters.
///
/// Enforced here, not by the store; the schema only requires non-null and unique.
pub const MAX_NAME_LENGTH: usize = 100;
