//! Failure report records and their lifecycle.
//!
//! A [`FailureRecord`] describes one failure event on one asset. The status
//! lifecycle is owned by the record-management layer; the metrics engine only
//! reads the resulting status values.

use crate::error::CoreError;
use crate::types::{fold_label, DbId, Timestamp};
use crate::validation::{validate_optional_non_negative, validate_priority, DEFAULT_PRIORITY};

// ---------------------------------------------------------------------------
// Status labels
// ---------------------------------------------------------------------------

/// Stored label for a newly reported failure.
pub const STATUS_REPORTED: &str = "Reportada";
/// Stored label for a failure being diagnosed.
pub const STATUS_UNDER_REVIEW: &str = "En Revisión";
/// Stored label for a failure under repair.
pub const STATUS_UNDER_REPAIR: &str = "En Reparación";
/// Stored label for a repaired failure.
pub const STATUS_RESOLVED: &str = "Resuelta";
/// Stored label for a resolved and verified failure.
pub const STATUS_CLOSED: &str = "Cerrada";
/// Stored label for a report that turned out not to be a failure.
pub const STATUS_INVALID: &str = "Inválida";

/// All stored failure status labels.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_REPORTED,
    STATUS_UNDER_REVIEW,
    STATUS_UNDER_REPAIR,
    STATUS_RESOLVED,
    STATUS_CLOSED,
    STATUS_INVALID,
];

// ---------------------------------------------------------------------------
// FailureStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a failure report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStatus {
    Reported,
    UnderReview,
    UnderRepair,
    Resolved,
    Closed,
    Invalid,
}

impl FailureStatus {
    /// Label as written by the record store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reported => STATUS_REPORTED,
            Self::UnderReview => STATUS_UNDER_REVIEW,
            Self::UnderRepair => STATUS_UNDER_REPAIR,
            Self::Resolved => STATUS_RESOLVED,
            Self::Closed => STATUS_CLOSED,
            Self::Invalid => STATUS_INVALID,
        }
    }

    /// Parse a stored or English label, case- and accent-insensitively.
    ///
    /// `"Completada"` is accepted as [`FailureStatus::Resolved`]; older
    /// records were closed with the work-order label.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match fold_label(s).as_str() {
            "reportada" | "reported" => Ok(Self::Reported),
            "en_revision" | "under_review" => Ok(Self::UnderReview),
            "en_reparacion" | "under_repair" => Ok(Self::UnderRepair),
            "resuelta" | "resolved" | "completada" => Ok(Self::Resolved),
            "cerrada" | "closed" => Ok(Self::Closed),
            "invalida" | "invalid" => Ok(Self::Invalid),
            _ => Err(CoreError::ContractViolation(format!(
                "Unknown failure status '{s}'. Valid statuses: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }

    /// Resolved or Closed: the failure has a final downtime value.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

// ---------------------------------------------------------------------------
// Status transitions
// ---------------------------------------------------------------------------

/// Returns the statuses that `from` may transition to.
///
/// Transition rules:
/// - `Reported`    -> `UnderReview`, `UnderRepair`, `Invalid`
/// - `UnderReview` -> `UnderRepair`, `Invalid`
/// - `UnderRepair` -> `Resolved`, `Invalid`
/// - `Resolved`    -> `Closed`
/// - `Closed`, `Invalid` are terminal
pub fn valid_transitions(from: FailureStatus) -> &'static [FailureStatus] {
    use FailureStatus::*;
    match from {
        Reported => &[UnderReview, UnderRepair, Invalid],
        UnderReview => &[UnderRepair, Invalid],
        UnderRepair => &[Resolved, Invalid],
        Resolved => &[Closed],
        Closed | Invalid => &[],
    }
}

/// Validate that a status transition from `current` to `next` is allowed.
pub fn validate_transition(current: FailureStatus, next: FailureStatus) -> Result<(), CoreError> {
    if valid_transitions(current).contains(&next) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity: "failure",
            from: current.as_str(),
            to: next.as_str(),
        })
    }
}

// ---------------------------------------------------------------------------
// FailureRecord
// ---------------------------------------------------------------------------

/// One failure event for one asset.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FailureRecord {
    pub id: Option<DbId>,
    pub asset_id: Option<DbId>,
    /// `None` only when the stored value could not be parsed.
    pub reported_at: Option<Timestamp>,
    /// Set on the first arrival in Resolved/Closed and never cleared.
    pub closed_at: Option<Timestamp>,
    /// `None` when the stored row carries no status.
    pub status: Option<FailureStatus>,
    pub downtime_hours: Option<f64>,
    pub root_cause: Option<String>,
    pub repair_cost: Option<f64>,
    /// 1 (highest) to 5.
    pub priority: i16,
    pub description: String,
    pub reported_by: String,
    pub assigned_to: Option<String>,
    /// Newline-separated log of repair actions.
    pub actions_taken: String,
}

impl FailureRecord {
    /// A freshly reported failure with the store's defaults.
    pub fn new(reported_at: Timestamp) -> Self {
        Self {
            id: None,
            asset_id: None,
            reported_at: Some(reported_at),
            closed_at: None,
            status: Some(FailureStatus::Reported),
            downtime_hours: Some(0.0),
            root_cause: None,
            repair_cost: None,
            priority: DEFAULT_PRIORITY,
            description: String::new(),
            reported_by: String::new(),
            assigned_to: None,
            actions_taken: String::new(),
        }
    }

    /// Check field ranges before the record is persisted.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_priority(self.priority)?;
        validate_optional_non_negative(self.downtime_hours, "downtime_hours")?;
        validate_optional_non_negative(self.repair_cost, "repair_cost")?;
        if self.reported_at.is_none() {
            return Err(CoreError::Validation(
                "failure report timestamp is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved or Closed. A record without a status is still open.
    pub fn is_resolved(&self) -> bool {
        matches!(self.status, Some(status) if status.is_resolved())
    }

    /// Move to `next`, stamping `closed_at` the first time the failure
    /// reaches Resolved or Closed. A record without a status advances as if
    /// newly reported.
    pub fn update_status(&mut self, next: FailureStatus, now: Timestamp) -> Result<(), CoreError> {
        validate_transition(self.status.unwrap_or(FailureStatus::Reported), next)?;
        self.status = Some(next);
        if next.is_resolved() && self.closed_at.is_none() {
            self.closed_at = Some(now);
        }
        Ok(())
    }

    /// Assign a technician. A failure still in Reported moves to UnderReview.
    pub fn assign_technician(&mut self, technician: &str) {
        self.assigned_to = Some(technician.to_string());
        if matches!(self.status, None | Some(FailureStatus::Reported)) {
            self.status = Some(FailureStatus::UnderReview);
        }
    }

    /// Append a repair action to the action log.
    pub fn record_action(&mut self, action: &str) {
        if !self.actions_taken.is_empty() {
            self.actions_taken.push('\n');
        }
        self.actions_taken.push_str(action);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
