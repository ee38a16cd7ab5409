//! # CLI Error Type
//!
//! Unified error type for command handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the CLI                                │
//! │                                                                         │
//! │  Command handler                                                        │
//! │  Result<(), CliError>                                                   │
//! │         │                                                               │
//! │         ├── DbError::NotFound ──────────────► NOT_FOUND       (exit 3)  │
//! │         ├── ValidationError / duplicate ────► VALIDATION_ERROR (exit 2) │
//! │         ├── ConcurrentDeletion ─────────────► CONFLICT        (exit 4)  │
//! │         ├── InsufficientQuantity ───────────► INSUFFICIENT_QUANTITY (5) │
//! │         ├── other DbError ──────────────────► DATABASE_ERROR  (exit 10) │
//! │         └── io / csv ───────────────────────► IO_ERROR        (exit 11) │
//! │                                                                         │
//! │  main() prints `message` to stderr and exits with the code.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use tracker_core::{CoreError, ValidationError};
use tracker_db::DbError;

/// Error returned from command handlers.
///
/// With `--json` this is what gets printed:
/// ```json
/// {
///   "code": "INSUFFICIENT_QUANTITY",
///   "message": "Insufficient quantity for Drill: available 8, requested 10"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct CliError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for CLI failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad arguments or input values
    ValidationError,

    /// No row with the given id
    NotFound,

    /// The row changed underneath the command; list again and retry
    Conflict,

    /// The adjustment would drive stock below zero
    InsufficientQuantity,

    /// Storage failure
    DatabaseError,

    /// File could not be read or written
    IoError,

    /// Configuration could not be resolved
    ConfigError,
}

impl ErrorCode {
    /// Process exit code for this error.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorCode::ValidationError => 2,
            ErrorCode::NotFound => 3,
            ErrorCode::Conflict => 4,
            ErrorCode::InsufficientQuantity => 5,
            ErrorCode::DatabaseError => 10,
            ErrorCode::IoError => 11,
            ErrorCode::ConfigError => 12,
        }
    }
}

impl CliError {
    /// Creates a new CLI error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        CliError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ConfigError, message)
    }
}

/// Converts store errors to CLI errors.
impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CliError::not_found(&entity, &id),
            DbError::UniqueViolation { value, .. } => {
                CliError::validation(format!("Equipment name '{}' already exists", value))
            }
            DbError::CheckViolation { message } => {
                tracing::error!("Check constraint failed: {}", message);
                CliError::validation("Value rejected by the database")
            }
            DbError::Domain(core) => core.into(),
            DbError::PoolExhausted => {
                CliError::new(ErrorCode::DatabaseError, "Database is busy; try again")
            }
            other => {
                tracing::error!("Database operation failed: {}", other);
                CliError::new(ErrorCode::DatabaseError, other.to_string())
            }
        }
    }
}

/// Converts core errors to CLI errors.
impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConcurrentDeletion { .. } => {
                CliError::new(ErrorCode::Conflict, err.to_string())
            }
            CoreError::InsufficientQuantity { .. } => {
                CliError::new(ErrorCode::InsufficientQuantity, err.to_string())
            }
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::validation(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::new(ErrorCode::IoError, err.to_string())
    }
}

impl From<csv::Error> for CliError {
    fn from(err: csv::Error) -> Self {
        CliError::new(ErrorCode::IoError, err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::new(ErrorCode::IoError, err.to_string())
    }
}

/// Result type for command handlers.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_quantity_mapping() {
        let err: CliError = DbError::Domain(CoreError::InsufficientQuantity {
            name: "Drill".to_string(),
            available: 8,
            requested: 10,
        })
        .into();

        assert_eq!(err.code, ErrorCode::InsufficientQuantity);
        assert_eq!(err.code.exit_code(), 5);
        assert_eq!(
            err.message,
            "Insufficient quantity for Drill: available 8, requested 10"
        );
    }

    #[test]
    fn test_concurrent_deletion_is_conflict() {
        let err: CliError = DbError::Domain(CoreError::ConcurrentDeletion {
            id: "abc".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[test]
    fn test_duplicate_is_validation() {
        let err: CliError = DbError::duplicate("equipment.name", "Drill").into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("Drill"));
    }

    #[test]
    fn test_json_shape() {
        let err = CliError::not_found("Equipment", "abc");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Equipment not found: abc");
    }
}
