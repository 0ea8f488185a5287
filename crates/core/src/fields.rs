//! Conversion from stored field-mappings into typed records.
//!
//! The record store hands over each row as a JSON object keyed by its column
//! names. Conversion follows the tolerance policy of the metrics engine:
//!
//! - missing or `null` optional fields become `None`;
//! - unparseable timestamps also become `None` (the record is kept, and the
//!   aggregates that need the timestamp skip it);
//! - fields no aggregate reads (ids, priority, free text, planning figures,
//!   materials) fall back to `None` or their default when they carry the
//!   wrong JSON type; whole floats such as `2.0` are accepted as integers;
//! - a row that is not an object, an unknown status or type label, or a
//!   non-numeric downtime, repair cost or actual cost is a caller contract
//!   violation and fails with [`CoreError::ContractViolation`].

use serde_json::{Map, Value};

use crate::asset::{Asset, Criticality, DEFAULT_ASSET_STATUS};
use crate::error::CoreError;
use crate::failure::{FailureRecord, FailureStatus};
use crate::types::{parse_timestamp, DbId, Timestamp};
use crate::validation::DEFAULT_PRIORITY;
use crate::work_order::{
    Material, WorkOrderRecord, WorkOrderStatus, WorkOrderType, DEFAULT_ESTIMATED_HOURS,
};

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const FAILURE_ID: &str = "falla_id";
pub const ASSET_ID: &str = "activo_id";
pub const REPORTED_AT: &str = "fecha_reporte";
pub const CLOSED_AT: &str = "fecha_cierre";
pub const STATUS: &str = "estado";
pub const DOWNTIME_HOURS: &str = "tiempo_fuera_servicio_h";
pub const ROOT_CAUSE: &str = "causa_raiz";
pub const REPAIR_COST: &str = "costo_reparacion";
pub const PRIORITY: &str = "prioridad";
pub const DESCRIPTION: &str = "descripcion";
pub const REPORTED_BY: &str = "reportada_por";
pub const ASSIGNED_TO: &str = "asignado_a";
pub const ACTIONS_TAKEN: &str = "acciones_tomadas";

pub const WORK_ORDER_ID: &str = "ot_id";
pub const WORK_ORDER_TYPE: &str = "tipo";
pub const CREATED_AT: &str = "fecha_creacion";
pub const SCHEDULED_FOR: &str = "fecha_programada";
pub const STARTED_AT: &str = "fecha_inicio";
pub const FINISHED_AT: &str = "fecha_fin";
pub const ACTUAL_COST: &str = "costo_real";
pub const ESTIMATED_COST: &str = "costo_estimado";
pub const ESTIMATED_HOURS: &str = "horas_estimadas";
pub const ACTUAL_HOURS: &str = "horas_reales";
pub const TECHNICIAN: &str = "tecnico_asignado";
pub const MATERIALS: &str = "materiales";
pub const NOTES: &str = "observaciones";

pub const ASSET_NAME: &str = "nombre";
pub const CRITICALITY: &str = "criticidad";
pub const REGISTERED_AT: &str = "fecha_alta";
pub const LOCATION: &str = "ubicacion";
pub const OWNER: &str = "responsable";
pub const OPERATING_HOURS: &str = "horas_operacion";
pub const LAST_MAINTENANCE: &str = "ultimo_mantenimiento";
pub const NEXT_MAINTENANCE: &str = "proximo_mantenimiento";

// ---------------------------------------------------------------------------
// Field accessors
// ---------------------------------------------------------------------------

fn as_object<'a>(row: &'a Value, entity: &str) -> Result<&'a Map<String, Value>, CoreError> {
    row.as_object().ok_or_else(|| {
        CoreError::ContractViolation(format!("{entity} record must be an object, got {row}"))
    })
}

/// Present, non-null value for `key`.
fn present<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|v| !v.is_null())
}

fn wrong_type(key: &str, expected: &str, value: &Value) -> CoreError {
    CoreError::ContractViolation(format!("field '{key}' must be {expected}, got {value}"))
}

/// Optional timestamp; malformed values are treated as absent.
fn timestamp(fields: &Map<String, Value>, key: &str) -> Option<Timestamp> {
    let value = present(fields, key)?;
    let parsed = value.as_str().and_then(parse_timestamp);
    if parsed.is_none() {
        tracing::debug!(field = key, value = %value, "Malformed timestamp treated as absent");
    }
    parsed
}

/// Numeric field summed by an aggregate; a wrong type is a contract
/// violation.
fn number(fields: &Map<String, Value>, key: &str) -> Result<Option<f64>, CoreError> {
    match present(fields, key) {
        None => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| wrong_type(key, "a number", v)),
    }
}

fn label<'a>(fields: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>, CoreError> {
    match present(fields, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(v) => Err(wrong_type(key, "a string label", v)),
    }
}

/// Integer value, accepting floats with no fractional part.
fn whole_number(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Field no aggregate reads; a value `convert` rejects is treated as absent.
fn lenient<T>(
    fields: &Map<String, Value>,
    key: &str,
    expected: &str,
    convert: impl FnOnce(&Value) -> Option<T>,
) -> Option<T> {
    let value = present(fields, key)?;
    let converted = convert(value);
    if converted.is_none() {
        tracing::debug!(
            field = key,
            value = %value,
            expected,
            "Wrong-typed field treated as absent"
        );
    }
    converted
}

fn optional_number(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    lenient(fields, key, "a number", Value::as_f64)
}

fn optional_text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    lenient(fields, key, "a string", |v| v.as_str().map(str::to_string))
}

fn id(fields: &Map<String, Value>, key: &str) -> Option<DbId> {
    lenient(fields, key, "an integer id", whole_number)
}

fn priority(fields: &Map<String, Value>) -> i16 {
    lenient(fields, PRIORITY, "a whole priority", |v| {
        whole_number(v).and_then(|p| i16::try_from(p).ok())
    })
    .unwrap_or(DEFAULT_PRIORITY)
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Convert a stored failure row.
pub fn failure_from_fields(row: &Value) -> Result<FailureRecord, CoreError> {
    let fields = as_object(row, "failure")?;
    let status = label(fields, STATUS)?
        .map(FailureStatus::from_str)
        .transpose()?;

    Ok(FailureRecord {
        id: id(fields, FAILURE_ID),
        asset_id: id(fields, ASSET_ID),
        reported_at: timestamp(fields, REPORTED_AT),
        closed_at: timestamp(fields, CLOSED_AT),
        status,
        downtime_hours: number(fields, DOWNTIME_HOURS)?,
        root_cause: optional_text(fields, ROOT_CAUSE),
        repair_cost: number(fields, REPAIR_COST)?,
        priority: priority(fields),
        description: optional_text(fields, DESCRIPTION).unwrap_or_default(),
        reported_by: optional_text(fields, REPORTED_BY).unwrap_or_default(),
        assigned_to: optional_text(fields, ASSIGNED_TO),
        actions_taken: optional_text(fields, ACTIONS_TAKEN).unwrap_or_default(),
    })
}

/// Convert a list of stored failure rows, failing on the first contract
/// violation.
pub fn failures_from_fields(rows: &[Value]) -> Result<Vec<FailureRecord>, CoreError> {
    rows.iter().map(failure_from_fields).collect()
}

/// Material line of a work order; `None` for an entry that is not an object.
fn material_from_fields(row: &Value) -> Option<Material> {
    let Some(fields) = row.as_object() else {
        tracing::debug!(value = %row, "Material entry that is not an object skipped");
        return None;
    };
    Some(Material {
        name: optional_text(fields, "nombre").unwrap_or_default(),
        quantity: optional_number(fields, "cantidad").unwrap_or(0.0),
        unit: optional_text(fields, "unidad").unwrap_or_default(),
        unit_cost: optional_number(fields, "costo_unitario"),
    })
}

/// Convert a stored work-order row.
///
/// `tipo` is required; `estado` defaults to Pending when missing.
pub fn work_order_from_fields(row: &Value) -> Result<WorkOrderRecord, CoreError> {
    let fields = as_object(row, "work order")?;
    let kind = match label(fields, WORK_ORDER_TYPE)? {
        Some(s) => WorkOrderType::from_str(s)?,
        None => {
            return Err(CoreError::ContractViolation(format!(
                "work order is missing '{WORK_ORDER_TYPE}'"
            )))
        }
    };
    let status = match label(fields, STATUS)? {
        Some(s) => WorkOrderStatus::from_str(s)?,
        None => WorkOrderStatus::Pending,
    };
    let materials = lenient(fields, MATERIALS, "an array", |v| v.as_array().cloned())
        .unwrap_or_default()
        .iter()
        .filter_map(material_from_fields)
        .collect();

    Ok(WorkOrderRecord {
        id: id(fields, WORK_ORDER_ID),
        asset_id: id(fields, ASSET_ID),
        kind,
        status,
        created_at: timestamp(fields, CREATED_AT),
        scheduled_for: timestamp(fields, SCHEDULED_FOR),
        started_at: timestamp(fields, STARTED_AT),
        finished_at: timestamp(fields, FINISHED_AT),
        actual_cost: number(fields, ACTUAL_COST)?,
        description: optional_text(fields, DESCRIPTION).unwrap_or_default(),
        priority: priority(fields),
        estimated_hours: optional_number(fields, ESTIMATED_HOURS)
            .unwrap_or(DEFAULT_ESTIMATED_HOURS),
        actual_hours: optional_number(fields, ACTUAL_HOURS),
        technician: optional_text(fields, TECHNICIAN).unwrap_or_default(),
        materials,
        notes: optional_text(fields, NOTES).unwrap_or_default(),
        estimated_cost: optional_number(fields, ESTIMATED_COST),
    })
}

/// Convert a list of stored work-order rows.
pub fn work_orders_from_fields(rows: &[Value]) -> Result<Vec<WorkOrderRecord>, CoreError> {
    rows.iter().map(work_order_from_fields).collect()
}

/// Convert a stored asset row. Name, criticality and a parseable
/// registration date are required.
pub fn asset_from_fields(row: &Value) -> Result<Asset, CoreError> {
    let fields = as_object(row, "asset")?;
    let name = optional_text(fields, ASSET_NAME).ok_or_else(|| {
        CoreError::ContractViolation(format!("asset is missing '{ASSET_NAME}'"))
    })?;
    let criticality = match label(fields, CRITICALITY)? {
        Some(s) => Criticality::from_str(s)?,
        None => {
            return Err(CoreError::ContractViolation(format!(
                "asset is missing '{CRITICALITY}'"
            )))
        }
    };
    let registered_at = timestamp(fields, REGISTERED_AT).ok_or_else(|| {
        CoreError::ContractViolation(format!("asset has no valid '{REGISTERED_AT}'"))
    })?;

    Ok(Asset {
        id: id(fields, ASSET_ID),
        name,
        criticality,
        registered_at,
        location: optional_text(fields, LOCATION).unwrap_or_default(),
        owner: optional_text(fields, OWNER).unwrap_or_default(),
        status: optional_text(fields, STATUS).unwrap_or_else(|| DEFAULT_ASSET_STATUS.to_string()),
        operating_hours: optional_number(fields, OPERATING_HOURS).unwrap_or(0.0),
        last_maintenance: timestamp(fields, LAST_MAINTENANCE),
        next_maintenance: timestamp(fields, NEXT_MAINTENANCE),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
