//! Physical assets tracked by the maintenance history.

use crate::error::CoreError;
use crate::types::{fold_label, DbId, Timestamp};
use crate::validation::validate_non_negative;

/// Status given to newly registered assets.
pub const DEFAULT_ASSET_STATUS: &str = "Activo";

/// How critical an asset is to operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    High,
    Medium,
    Low,
}

impl Criticality {
    /// Label as written by the record store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "Alta",
            Self::Medium => "Media",
            Self::Low => "Baja",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match fold_label(s).as_str() {
            "alta" | "high" => Ok(Self::High),
            "media" | "medium" => Ok(Self::Medium),
            "baja" | "low" => Ok(Self::Low),
            _ => Err(CoreError::ContractViolation(format!(
                "Unknown criticality '{s}'"
            ))),
        }
    }
}

/// A physical equipment unit.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Asset {
    pub id: Option<DbId>,
    pub name: String,
    pub criticality: Criticality,
    pub registered_at: Timestamp,
    pub location: String,
    pub owner: String,
    /// Free-form operating status ("Activo", "Inactivo", "En Mantenimiento").
    pub status: String,
    pub operating_hours: f64,
    pub last_maintenance: Option<Timestamp>,
    pub next_maintenance: Option<Timestamp>,
}

impl Asset {
    pub fn new(name: &str, criticality: Criticality, registered_at: Timestamp) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            criticality,
            registered_at,
            location: String::new(),
            owner: String::new(),
            status: DEFAULT_ASSET_STATUS.to_string(),
            operating_hours: 0.0,
            last_maintenance: None,
            next_maintenance: None,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("asset name is required".to_string()));
        }
        validate_non_negative(self.operating_hours, "operating_hours")
    }

    pub fn update_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    /// Set the next planned maintenance date.
    ///
    /// A date before the last recorded maintenance is rejected.
    pub fn schedule_maintenance(&mut self, date: Timestamp) -> Result<(), CoreError> {
        if let Some(last) = self.last_maintenance {
            if date < last {
                return Err(CoreError::Validation(format!(
                    "next maintenance {date} is before last maintenance {last}"
                )));
            }
        }
        self.next_maintenance = Some(date);
        Ok(())
    }

    /// Record that maintenance was performed at `date`.
    ///
    /// A planned date at or before `date` has been fulfilled and is cleared.
    pub fn record_maintenance(&mut self, date: Timestamp) {
        self.last_maintenance = Some(date);
        if self.next_maintenance.is_some_and(|next| next <= date) {
            self.next_maintenance = None;
        }
    }
}
