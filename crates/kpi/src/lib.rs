//! `upkeep-kpi` library crate.
//!
//! Loads a record snapshot, runs the reliability metrics engine and renders
//! the result as JSON. The binary entrypoint lives in `main.rs`.

pub mod config;
pub mod snapshot;

use serde_json::{json, Value};
use upkeep_core::kpi::compute_asset_kpis_from_fields;
use upkeep_core::report::generate_statistical_report_from_fields;

use crate::config::{Command, KpiConfig};
use crate::snapshot::Snapshot;

/// Run the configured command over `snapshot` and return the JSON document
/// to print.
///
/// A report with no data renders as `{}`.
pub fn execute(config: &KpiConfig, snapshot: &Snapshot) -> anyhow::Result<Value> {
    match config.command {
        Command::Kpis => {
            let kpis = compute_asset_kpis_from_fields(
                &snapshot.failures,
                snapshot.work_orders.as_deref(),
            )?;
            tracing::info!(
                mtbf_hours = kpis.mtbf_hours,
                mttr_hours = kpis.mttr_hours,
                availability = kpis.availability,
                failures = kpis.failure_count,
                "Asset KPIs computed",
            );
            Ok(serde_json::to_value(kpis)?)
        }
        Command::Report => {
            let report = generate_statistical_report_from_fields(
                &snapshot.failures,
                config.period_start,
                config.period_end,
            )?;
            match report {
                Some(report) => {
                    tracing::info!(total_failures = report.total_failures, "Failure report built");
                    Ok(serde_json::to_value(report)?)
                }
                None => {
                    tracing::info!("No failures to report for the requested period");
                    Ok(json!({}))
                }
            }
        }
    }
}
