//! Shared value validation helpers.
//!
//! Range checks used by the record modules at the record-management boundary.
//! The metrics engine never calls these; it tolerates whatever it is given.

use crate::error::CoreError;

/// Highest priority level (most urgent).
pub const PRIORITY_HIGHEST: i16 = 1;
/// Lowest priority level.
pub const PRIORITY_LOWEST: i16 = 5;
/// Priority assigned to new records when none is given.
pub const DEFAULT_PRIORITY: i16 = 3;

/// Validate that a priority falls within `[1, 5]`.
pub fn validate_priority(priority: i16) -> Result<(), CoreError> {
    if !(PRIORITY_HIGHEST..=PRIORITY_LOWEST).contains(&priority) {
        return Err(CoreError::Validation(format!(
            "priority must be between {PRIORITY_HIGHEST} and {PRIORITY_LOWEST}, got {priority}"
        )));
    }
    Ok(())
}

/// Validate that a real-valued quantity (hours, cost) is finite and `>= 0`.
///
/// Returns a `CoreError::Validation` naming the field otherwise.
pub fn validate_non_negative(value: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::Validation(format!(
            "{name} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

/// Like [`validate_non_negative`] for optional fields; `None` is always valid.
pub fn validate_optional_non_negative(value: Option<f64>, name: &str) -> Result<(), CoreError> {
    match value {
        Some(v) => validate_non_negative(v, name),
        None => Ok(()),
    }
}
