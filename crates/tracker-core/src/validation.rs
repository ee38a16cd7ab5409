//! # Validation Module
//!
//! Input validation run before a write unit opens.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (CLI / UI)                                            │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Name present and within length                                    │
//! │  └── Quantities and minimums non-negative                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE (name) constraints                              │
//! │  ├── CHECK (quantity >= 0)                                             │
//! │  └── Foreign key with ON DELETE CASCADE                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tracker_core::validation::{validate_equipment_name, validate_quantity};
//!
//! validate_equipment_name("Drill").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::types::{EquipmentUpdate, NewEquipment};
use crate::MAX_NAME_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an equipment name.
///
/// ## Rules
/// - Must not be blank
/// - At most [`MAX_NAME_LENGTH`] characters after trimming
///
/// ## Example
/// ```rust
/// use tracker_core::validation::validate_equipment_name;
///
/// assert!(validate_equipment_name("Cordless Drill").is_ok());
/// assert!(validate_equipment_name("").is_err());
/// ```
pub fn validate_equipment_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates an equipment ID (UUID format).
///
/// ## Example
/// ```rust
/// use tracker_core::validation::validate_equipment_id;
///
/// assert!(validate_equipment_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_equipment_id("not-a-uuid").is_err());
/// ```
pub fn validate_equipment_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a stock quantity. Zero is allowed; negative is not.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    non_negative("quantity", qty)
}

/// Validates an advisory minimum stock level.
pub fn validate_min_stock_level(min: i64) -> ValidationResult<()> {
    non_negative("min stock level", min)
}

/// Validates a quantity adjustment. A zero delta is not a change and would
/// only add an empty audit row.
pub fn validate_delta(delta: i64) -> ValidationResult<()> {
    if delta == 0 {
        return Err(ValidationError::NoChange {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Computes `current + delta`, rejecting overflow.
///
/// Going below zero is not checked here; the concurrency guard reports that
/// as insufficient quantity with the freshly read stock.
pub fn apply_delta(current: i64, delta: i64) -> ValidationResult<i64> {
    current.checked_add(delta).ok_or_else(|| ValidationError::Overflow {
        field: "quantity".to_string(),
    })
}

fn non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
            value,
        });
    }

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates creation input.
pub fn validate_new_equipment(input: &NewEquipment) -> ValidationResult<()> {
    validate_equipment_name(&input.name)?;
    validate_quantity(input.quantity)?;
    validate_min_stock_level(input.min_stock_level)?;
    Ok(())
}

/// Validates a field-only edit.
pub fn validate_equipment_update(update: &EquipmentUpdate) -> ValidationResult<()> {
    validate_equipment_name(&update.name)?;
    validate_min_stock_level(update.min_stock_level)?;
    Ok(())
}

/// Validates that `start` is not after `end`.
pub fn validate_date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> ValidationResult<()> {
    if start > end {
        return Err(ValidationError::InvalidRange {
            field: "date".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
