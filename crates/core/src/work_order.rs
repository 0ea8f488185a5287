//! Work order records, their taxonomies and lifecycle.
//!
//! Work orders feed the preventive-compliance and cost rollups in
//! [`crate::kpi`]. Invariant: `finished_at` is only ever set together with
//! the Completed status.

use crate::error::CoreError;
use crate::types::{fold_label, DbId, Timestamp};
use crate::validation::{
    validate_non_negative, validate_optional_non_negative, validate_priority, DEFAULT_PRIORITY,
};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Estimated hours assigned to a new work order.
pub const DEFAULT_ESTIMATED_HOURS: f64 = 1.0;

// ---------------------------------------------------------------------------
// WorkOrderType
// ---------------------------------------------------------------------------

/// Kind of maintenance task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderType {
    Preventive,
    Corrective,
    Predictive,
    Inspection,
    Calibration,
    Other,
}

impl WorkOrderType {
    /// Label as written by the record store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preventive => "Preventivo",
            Self::Corrective => "Correctivo",
            Self::Predictive => "Predictivo",
            Self::Inspection => "Inspección",
            Self::Calibration => "Calibración",
            Self::Other => "Otro",
        }
    }

    /// Parse a stored or English label, case- and accent-insensitively.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match fold_label(s).as_str() {
            "preventivo" | "preventive" => Ok(Self::Preventive),
            "correctivo" | "corrective" => Ok(Self::Corrective),
            "predictivo" | "predictive" => Ok(Self::Predictive),
            "inspeccion" | "inspection" => Ok(Self::Inspection),
            "calibracion" | "calibration" => Ok(Self::Calibration),
            "otro" | "other" => Ok(Self::Other),
            _ => Err(CoreError::ContractViolation(format!(
                "Unknown work order type '{s}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkOrderStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    Pending,
    Scheduled,
    InProgress,
    Paused,
    Completed,
    Cancelled,
}

impl WorkOrderStatus {
    /// Label as written by the record store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::Scheduled => "Programada",
            Self::InProgress => "En Proceso",
            Self::Paused => "Pausada",
            Self::Completed => "Completada",
            Self::Cancelled => "Cancelada",
        }
    }

    /// Parse a stored or English label, case- and accent-insensitively.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match fold_label(s).as_str() {
            "pendiente" | "pending" => Ok(Self::Pending),
            "programada" | "scheduled" => Ok(Self::Scheduled),
            "en_proceso" | "in_progress" => Ok(Self::InProgress),
            "pausada" | "paused" => Ok(Self::Paused),
            "completada" | "completed" => Ok(Self::Completed),
            "cancelada" | "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(CoreError::ContractViolation(format!(
                "Unknown work order status '{s}'"
            ))),
        }
    }

    /// Completed and Cancelled accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Returns the statuses that `from` may transition to.
///
/// Transition rules:
/// - `Pending`    -> `Scheduled`, `InProgress`, `Cancelled`
/// - `Scheduled`  -> `InProgress`, `Cancelled`
/// - `InProgress` -> `Paused`, `Completed`, `Cancelled`
/// - `Paused`     -> `InProgress`, `Completed`, `Cancelled`
/// - `Completed`, `Cancelled` are terminal
pub fn valid_transitions(from: WorkOrderStatus) -> &'static [WorkOrderStatus] {
    use WorkOrderStatus::*;
    match from {
        Pending => &[Scheduled, InProgress, Cancelled],
        Scheduled => &[InProgress, Cancelled],
        InProgress => &[Paused, Completed, Cancelled],
        Paused => &[InProgress, Completed, Cancelled],
        Completed | Cancelled => &[],
    }
}

/// Validate that a status transition from `current` to `next` is allowed.
pub fn validate_transition(
    current: WorkOrderStatus,
    next: WorkOrderStatus,
) -> Result<(), CoreError> {
    if valid_transitions(current).contains(&next) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity: "work order",
            from: current.as_str(),
            to: next.as_str(),
        })
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A material line on a work order.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Material {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_cost: Option<f64>,
}

/// One maintenance task for one asset.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct WorkOrderRecord {
    pub id: Option<DbId>,
    pub asset_id: Option<DbId>,
    pub kind: WorkOrderType,
    pub status: WorkOrderStatus,
    pub created_at: Option<Timestamp>,
    pub scheduled_for: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub actual_cost: Option<f64>,
    pub description: String,
    pub priority: i16,
    pub estimated_hours: f64,
    pub actual_hours: Option<f64>,
    pub technician: String,
    pub materials: Vec<Material>,
    pub notes: String,
    pub estimated_cost: Option<f64>,
}

impl WorkOrderRecord {
    /// A pending work order of `kind` due at `scheduled_for`.
    pub fn new(kind: WorkOrderType, scheduled_for: Timestamp) -> Self {
        Self {
            id: None,
            asset_id: None,
            kind,
            status: WorkOrderStatus::Pending,
            created_at: None,
            scheduled_for: Some(scheduled_for),
            started_at: None,
            finished_at: None,
            actual_cost: None,
            description: String::new(),
            priority: DEFAULT_PRIORITY,
            estimated_hours: DEFAULT_ESTIMATED_HOURS,
            actual_hours: None,
            technician: String::new(),
            materials: Vec::new(),
            notes: String::new(),
            estimated_cost: None,
        }
    }

    /// Check field ranges and the finish/status invariant.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_priority(self.priority)?;
        validate_non_negative(self.estimated_hours, "estimated_hours")?;
        validate_optional_non_negative(self.actual_hours, "actual_hours")?;
        validate_optional_non_negative(self.actual_cost, "actual_cost")?;
        validate_optional_non_negative(self.estimated_cost, "estimated_cost")?;
        if self.finished_at.is_some() && self.status != WorkOrderStatus::Completed {
            return Err(CoreError::Validation(format!(
                "work order has a finish time but status is '{}'",
                self.status.as_str()
            )));
        }
        Ok(())
    }

    fn transition(&mut self, next: WorkOrderStatus) -> Result<(), CoreError> {
        validate_transition(self.status, next)?;
        self.status = next;
        Ok(())
    }

    /// Mark a scheduled work order. Only valid from Pending.
    pub fn schedule(&mut self, scheduled_for: Timestamp) -> Result<(), CoreError> {
        self.transition(WorkOrderStatus::Scheduled)?;
        self.scheduled_for = Some(scheduled_for);
        Ok(())
    }

    fn rejected(&self, next: WorkOrderStatus) -> CoreError {
        CoreError::InvalidTransition {
            entity: "work order",
            from: self.status.as_str(),
            to: next.as_str(),
        }
    }

    /// Begin work on a Pending or Scheduled order, stamping `started_at` on
    /// the first start.
    ///
    /// A Paused order goes back to work through [`resume`](Self::resume);
    /// every other rejection comes from [`valid_transitions`].
    pub fn start(&mut self, now: Timestamp) -> Result<(), CoreError> {
        if self.status == WorkOrderStatus::Paused {
            return Err(self.rejected(WorkOrderStatus::InProgress));
        }
        self.transition(WorkOrderStatus::InProgress)?;
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), CoreError> {
        self.transition(WorkOrderStatus::Paused)
    }

    /// Return a Paused order to work. Pending and Scheduled orders use
    /// [`start`](Self::start).
    pub fn resume(&mut self) -> Result<(), CoreError> {
        if self.status != WorkOrderStatus::Paused {
            return Err(self.rejected(WorkOrderStatus::InProgress));
        }
        self.transition(WorkOrderStatus::InProgress)
    }

    /// Close out the work order, recording notes and, when given, the actual
    /// hours and cost.
    pub fn complete(
        &mut self,
        notes: &str,
        actual_hours: Option<f64>,
        actual_cost: Option<f64>,
        now: Timestamp,
    ) -> Result<(), CoreError> {
        validate_optional_non_negative(actual_hours, "actual_hours")?;
        validate_optional_non_negative(actual_cost, "actual_cost")?;
        self.transition(WorkOrderStatus::Completed)?;
        self.finished_at = Some(now);
        self.notes = notes.to_string();
        if actual_hours.is_some() {
            self.actual_hours = actual_hours;
        }
        if actual_cost.is_some() {
            self.actual_cost = actual_cost;
        }
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), CoreError> {
        self.transition(WorkOrderStatus::Cancelled)
    }

    /// Add a material line. A known unit cost is added to the estimate.
    pub fn add_material(
        &mut self,
        name: &str,
        quantity: f64,
        unit: &str,
        unit_cost: Option<f64>,
    ) -> Result<(), CoreError> {
        validate_non_negative(quantity, "quantity")?;
        validate_optional_non_negative(unit_cost, "unit_cost")?;
        if let Some(cost) = unit_cost {
            *self.estimated_cost.get_or_insert(0.0) += quantity * cost;
        }
        self.materials.push(Material {
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
            unit_cost,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_timestamp;
    use assert_matches::assert_matches;

    fn ts(s: &str) -> Timestamp {
        parse_timestamp(s).unwrap()
    }

    fn preventive() -> WorkOrderRecord {
        WorkOrderRecord::new(WorkOrderType::Preventive, ts("2024-01-05"))
    }

    // -- labels --

    #[test]
    fn type_accepts_any_case_of_stored_label() {
        for label in ["Preventivo", "PREVENTIVO", "preventivo", "preventive"] {
            assert_eq!(
                WorkOrderType::from_str(label).unwrap(),
                WorkOrderType::Preventive
            );
        }
        assert_eq!(
            WorkOrderType::from_str("Inspeccion").unwrap(),
            WorkOrderType::Inspection
        );
    }

    #[test]
    fn status_round_trips_through_stored_label() {
        use WorkOrderStatus::*;
        for status in [Pending, Scheduled, InProgress, Paused, Completed, Cancelled] {
            assert_eq!(WorkOrderStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert_eq!(WorkOrderStatus::from_str("COMPLETADA").unwrap(), Completed);
    }

    #[test]
    fn unknown_labels_are_contract_violations() {
        assert_matches!(
            WorkOrderType::from_str("Urgente"),
            Err(CoreError::ContractViolation(_))
        );
        assert_matches!(
            WorkOrderStatus::from_str("Archivada"),
            Err(CoreError::ContractViolation(_))
        );
    }

    // -- transitions --

    #[test]
    fn terminal_states_have_no_exits() {
        assert!(WorkOrderStatus::Completed.is_terminal());
        assert!(WorkOrderStatus::Cancelled.is_terminal());
        assert!(valid_transitions(WorkOrderStatus::Completed).is_empty());
        assert!(valid_transitions(WorkOrderStatus::Cancelled).is_empty());
    }

    #[test]
    fn full_lifecycle_with_pause() {
        let mut wo = preventive();
        wo.schedule(ts("2024-01-05")).unwrap();
        wo.start(ts("2024-01-05T08:00:00")).unwrap();
        wo.pause().unwrap();
        wo.resume().unwrap();
        wo.complete("ok", Some(2.5), Some(120.0), ts("2024-01-05T12:00:00"))
            .unwrap();

        assert_eq!(wo.status, WorkOrderStatus::Completed);
        assert_eq!(wo.started_at, Some(ts("2024-01-05T08:00:00")));
        assert_eq!(wo.finished_at, Some(ts("2024-01-05T12:00:00")));
        assert_eq!(wo.actual_hours, Some(2.5));
        assert_eq!(wo.actual_cost, Some(120.0));
        assert_eq!(wo.notes, "ok");
        assert!(wo.validate().is_ok());
    }

    #[test]
    fn complete_keeps_existing_cost_when_none_given() {
        let mut wo = preventive();
        wo.actual_cost = Some(50.0);
        wo.start(ts("2024-01-05T08:00:00")).unwrap();
        wo.complete("", None, None, ts("2024-01-05T09:00:00"))
            .unwrap();
        assert_eq!(wo.actual_cost, Some(50.0));
    }

    #[test]
    fn cannot_complete_a_pending_order() {
        let mut wo = preventive();
        assert_matches!(
            wo.complete("", None, None, ts("2024-01-05T09:00:00")),
            Err(CoreError::InvalidTransition { .. })
        );
        assert!(wo.finished_at.is_none());
    }

    #[test]
    fn pause_requires_in_progress() {
        let mut wo = preventive();
        assert!(wo.pause().is_err());
        assert!(wo.resume().is_err());
    }

    #[test]
    fn paused_order_restarts_only_through_resume() {
        let mut wo = preventive();
        wo.start(ts("2024-01-05T08:00:00")).unwrap();
        wo.pause().unwrap();
        assert_matches!(
            wo.start(ts("2024-01-05T10:00:00")),
            Err(CoreError::InvalidTransition { from: "Pausada", .. })
        );
        assert_eq!(wo.status, WorkOrderStatus::Paused);

        wo.resume().unwrap();
        assert_eq!(wo.status, WorkOrderStatus::InProgress);
        assert_eq!(wo.started_at, Some(ts("2024-01-05T08:00:00")));
    }

    #[test]
    fn start_is_rejected_once_finished() {
        let mut wo = preventive();
        wo.start(ts("2024-01-05T08:00:00")).unwrap();
        wo.complete("", None, None, ts("2024-01-05T09:00:00"))
            .unwrap();
        assert!(wo.start(ts("2024-01-06T08:00:00")).is_err());
    }

    #[test]
    fn cancel_from_any_non_terminal_state() {
        let mut wo = preventive();
        assert!(wo.cancel().is_ok());
        assert!(wo.cancel().is_err());

        let mut wo = preventive();
        wo.start(ts("2024-01-05T08:00:00")).unwrap();
        wo.pause().unwrap();
        assert!(wo.cancel().is_ok());
    }

    #[test]
    fn validate_rejects_finish_without_completion() {
        let mut wo = preventive();
        wo.finished_at = Some(ts("2024-01-05T09:00:00"));
        assert_matches!(wo.validate(), Err(CoreError::Validation(_)));
    }

    // -- materials --

    #[test]
    fn materials_with_unit_cost_accumulate_estimate() {
        let mut wo = preventive();
        wo.add_material("Grease", 2.0, "kg", Some(10.0)).unwrap();
        wo.add_material("Rags", 5.0, "u", None).unwrap();
        wo.add_material("Filter", 1.0, "u", Some(35.5)).unwrap();

        assert_eq!(wo.materials.len(), 3);
        assert_eq!(wo.estimated_cost, Some(55.5));
    }

    #[test]
    fn materials_without_cost_leave_estimate_absent() {
        let mut wo = preventive();
        wo.add_material("Rags", 5.0, "u", None).unwrap();
        assert!(wo.estimated_cost.is_none());
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let mut wo = preventive();
        assert!(wo.add_material("Grease", -1.0, "kg", None).is_err());
        assert!(wo.materials.is_empty());
    }
}
