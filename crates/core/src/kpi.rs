//! Reliability metrics engine: MTBF, MTTR, availability, preventive
//! compliance and cost rollups for one asset.
//!
//! Everything here is a pure function over borrowed records. No state is kept
//! between calls and inputs are never mutated, so callers may invoke these
//! concurrently without coordination.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::error::CoreError;
use crate::failure::FailureRecord;
use crate::fields::{failures_from_fields, work_orders_from_fields};
use crate::types::Timestamp;
use crate::work_order::{WorkOrderRecord, WorkOrderStatus, WorkOrderType};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Milliseconds per hour, the resolution used for interval arithmetic.
pub const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Availability reported for an asset without repeated failures.
pub const AVAILABILITY_WITHOUT_FAILURES: f64 = 1.0;

/// Grace period after the scheduled date within which a preventive order
/// still counts as on time.
pub fn preventive_grace() -> Duration {
    Duration::days(1)
}

// ---------------------------------------------------------------------------
// Result type
// ---------------------------------------------------------------------------

/// KPIs for one asset. Recomputed on every call, never persisted here.
///
/// Serializes with the flat key set consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MetricsResult {
    pub mtbf_hours: f64,
    pub mttr_hours: f64,
    #[serde(rename = "disponibilidad")]
    pub availability: f64,
    /// Number of resolved/closed failures.
    #[serde(rename = "num_fallas")]
    pub failure_count: usize,
    #[serde(rename = "num_intervalos_mtbf")]
    pub mtbf_interval_count: usize,
    /// Percentage in `[0, 100]`; `None` when there are no preventive orders.
    #[serde(rename = "cumplimiento_preventivo")]
    pub preventive_compliance: Option<f64>,
    #[serde(rename = "costo_total_mantenimiento")]
    pub total_maintenance_cost: f64,
    #[serde(rename = "ultima_actualizacion")]
    pub computed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

fn hours_between(earlier: Timestamp, later: Timestamp) -> f64 {
    (later - earlier).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

/// Mean time between failures in hours, plus the number of intervals used.
///
/// Input order does not matter. Fewer than two timestamps yield `(0.0, 0)`.
/// Duplicate timestamps contribute zero-length intervals.
///
/// # Examples
///
/// ```
/// use upkeep_core::kpi::compute_mtbf;
/// use upkeep_core::types::parse_timestamp;
///
/// let ts: Vec<_> = ["2024-01-03", "2024-01-01"]
///     .iter()
///     .filter_map(|s| parse_timestamp(s))
///     .collect();
/// assert_eq!(compute_mtbf(&ts), (48.0, 1));
/// ```
pub fn compute_mtbf(failure_timestamps: &[Timestamp]) -> (f64, usize) {
    if failure_timestamps.len() < 2 {
        return (0.0, 0);
    }

    let mut sorted = failure_timestamps.to_vec();
    sorted.sort_unstable();

    let intervals: Vec<f64> = sorted
        .windows(2)
        .map(|pair| hours_between(pair[0], pair[1]))
        .collect();

    let mtbf = intervals.iter().sum::<f64>() / intervals.len() as f64;
    (mtbf, intervals.len())
}

/// Mean time to repair in hours; `0.0` for no durations.
///
/// No filtering is applied; callers pass only resolved repairs.
pub fn compute_mttr(repair_durations: &[f64]) -> f64 {
    if repair_durations.is_empty() {
        return 0.0;
    }
    repair_durations.iter().sum::<f64>() / repair_durations.len() as f64
}

/// `mtbf / (mtbf + mttr)`, or `0.0` when `mtbf <= 0`.
pub fn compute_availability(mtbf_hours: f64, mttr_hours: f64) -> f64 {
    if mtbf_hours <= 0.0 {
        return 0.0;
    }
    mtbf_hours / (mtbf_hours + mttr_hours)
}

/// Percentage of preventive orders completed no later than one day after
/// their scheduled date. `None` when no preventive orders exist.
pub fn compute_preventive_compliance(work_orders: &[WorkOrderRecord]) -> Option<f64> {
    let preventive: Vec<&WorkOrderRecord> = work_orders
        .iter()
        .filter(|wo| wo.kind == WorkOrderType::Preventive)
        .collect();
    if preventive.is_empty() {
        return None;
    }

    let on_time = preventive
        .iter()
        .filter(|wo| wo.status == WorkOrderStatus::Completed)
        .filter(|wo| match (wo.finished_at, wo.scheduled_for) {
            (Some(finished), Some(scheduled)) => finished <= scheduled + preventive_grace(),
            _ => false,
        })
        .count();

    Some(on_time as f64 / preventive.len() as f64 * 100.0)
}

/// Sum of the actual costs that are present.
pub fn compute_total_cost(work_orders: &[WorkOrderRecord]) -> f64 {
    work_orders.iter().filter_map(|wo| wo.actual_cost).sum()
}

// ---------------------------------------------------------------------------
// Composite
// ---------------------------------------------------------------------------

/// Compute the full KPI set for one asset, stamped with the current time.
pub fn compute_asset_kpis(
    failures: &[FailureRecord],
    work_orders: Option<&[WorkOrderRecord]>,
) -> MetricsResult {
    compute_asset_kpis_at(failures, work_orders, Utc::now())
}

/// Compute the full KPI set for one asset with an explicit computation time.
///
/// Only Resolved/Closed failures take part in MTBF and MTTR. An asset whose
/// MTBF is zero (fewer than two resolved failures) is reported as fully
/// available.
pub fn compute_asset_kpis_at(
    failures: &[FailureRecord],
    work_orders: Option<&[WorkOrderRecord]>,
    computed_at: DateTime<Utc>,
) -> MetricsResult {
    let resolved: Vec<&FailureRecord> = failures
        .iter()
        .filter(|f| f.is_resolved())
        .collect();

    let report_times: Vec<Timestamp> = resolved.iter().filter_map(|f| f.reported_at).collect();
    if report_times.len() < resolved.len() {
        tracing::debug!(
            skipped = resolved.len() - report_times.len(),
            "Resolved failures without a valid report timestamp excluded from MTBF"
        );
    }
    let (mtbf_hours, mtbf_interval_count) = compute_mtbf(&report_times);

    let downtimes: Vec<f64> = resolved.iter().filter_map(|f| f.downtime_hours).collect();
    let mttr_hours = compute_mttr(&downtimes);

    let availability = if mtbf_hours > 0.0 {
        compute_availability(mtbf_hours, mttr_hours)
    } else {
        AVAILABILITY_WITHOUT_FAILURES
    };

    let (preventive_compliance, total_maintenance_cost) = match work_orders {
        Some(orders) => (
            compute_preventive_compliance(orders),
            compute_total_cost(orders),
        ),
        None => (None, 0.0),
    };

    MetricsResult {
        mtbf_hours,
        mttr_hours,
        availability,
        failure_count: resolved.len(),
        mtbf_interval_count,
        preventive_compliance,
        total_maintenance_cost,
        computed_at,
    }
}

/// Compute asset KPIs straight from stored field-mappings.
///
/// Only contract violations in the rows are reported as errors; malformed
/// optional values are tolerated as described in [`crate::fields`].
pub fn compute_asset_kpis_from_fields(
    failures: &[Value],
    work_orders: Option<&[Value]>,
) -> Result<MetricsResult, CoreError> {
    let failures = failures_from_fields(failures)?;
    let work_orders = work_orders.map(work_orders_from_fields).transpose()?;
    Ok(compute_asset_kpis(&failures, work_orders.as_deref()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
