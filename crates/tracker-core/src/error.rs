//! # Error Types
//!
//! Domain-specific error types for tracker-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tracker-core errors (this file)                                       │
//! │  ├── CoreError        - Recoverable domain conditions                  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tracker-db errors (separate crate)                                    │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing in here is a crash: every variant is a structured condition the
//! caller can report and recover from.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain conditions raised by the store's read-check before a write.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The row vanished between the caller's snapshot and the write.
    ///
    /// ## When This Occurs
    /// ```text
    /// Caller A lists equipment (sees "Drill")
    ///      │
    ///      │        Caller B deletes "Drill"
    ///      ▼
    /// Caller A adjusts "Drill" by +1
    ///      │
    ///      ▼
    /// Re-fetch finds nothing → ConcurrentDeletion
    ///      │
    ///      ▼
    /// Caller refreshes its view
    /// ```
    #[error("Equipment {id} was deleted by another operation; refresh and try again")]
    ConcurrentDeletion { id: String },

    /// The adjustment would drive quantity below zero.
    ///
    /// `available` is the freshly read quantity, never a cached one.
    #[error("Insufficient quantity for {name}: available {available}, requested {requested}")]
    InsufficientQuantity {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true if the caller should refresh its view of current state.
    pub fn requires_refresh(&self) -> bool {
        matches!(self, CoreError::ConcurrentDeletion { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These are detected before a write unit opens and are never persisted.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must not be negative.
    #[error("{field} cannot be negative (got {value})")]
    Negative { field: String, value: i64 },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Start of a range lies after its end.
    #[error("{field} range is empty: start is after end")]
    InvalidRange { field: String },

    /// A change that would leave the value as it was.
    #[error("{field} change must not be zero")]
    NoChange { field: String },

    /// Arithmetic on the value would overflow.
    #[error("{field} would overflow")]
    Overflow { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientQuantity {
            name: "Drill".to_string(),
            available: 8,
            requested: 10,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient quantity for Drill: available 8, requested 10"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::Negative {
            field: "quantity".to_string(),
            value: -3,
        };
        assert_eq!(err.to_string(), "quantity cannot be negative (got -3)");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.requires_refresh());
    }

    #[test]
    fn test_concurrent_deletion_requires_refresh() {
        let err = CoreError::ConcurrentDeletion {
            id: "abc".to_string(),
        };
        assert!(err.requires_refresh());
    }
}
