//! Statistical failure report over an optional time window.
//!
//! Summarises a set of failures: counts, downtime, repair cost, the most
//! frequent root causes and the status distribution. Malformed history never
//! aborts a report; records that cannot be placed in the window are dropped.

use serde_json::Value;

use crate::error::CoreError;
use crate::failure::{FailureRecord, FailureStatus};
use crate::fields::failures_from_fields;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of entries in the root-cause and status tables.
pub const TOP_N: usize = 5;

/// Bucket for failures recorded without a root cause.
pub const UNSPECIFIED_ROOT_CAUSE: &str = "unspecified";

/// Bucket for failures stored without a status.
pub const UNKNOWN_STATUS: &str = "Desconocido";

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// One row of a frequency table.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Aggregate statistics over the failures in a period.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FailureReport {
    #[serde(rename = "periodo_inicio")]
    pub period_start: Option<Timestamp>,
    #[serde(rename = "periodo_fin")]
    pub period_end: Option<Timestamp>,
    #[serde(rename = "total_fallas")]
    pub total_failures: usize,
    /// Mean over the failures that carry a downtime value.
    #[serde(rename = "tiempo_promedio_reparacion")]
    pub mean_repair_hours: f64,
    #[serde(rename = "tiempo_total_fuera_servicio")]
    pub total_downtime_hours: f64,
    #[serde(rename = "costo_total_reparaciones")]
    pub total_repair_cost: f64,
    /// Top causes by descending count; ties keep first-seen order.
    #[serde(rename = "causas_raiz")]
    pub root_causes: Vec<LabelCount>,
    /// Top statuses by descending count; ties keep first-seen order.
    #[serde(rename = "distribucion_por_estado")]
    pub status_distribution: Vec<LabelCount>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Whether `failure` falls inside the inclusive `[start, end]` window.
///
/// A failure without a report timestamp is never inside a bounded window.
fn in_period(failure: &FailureRecord, start: Option<Timestamp>, end: Option<Timestamp>) -> bool {
    let Some(reported) = failure.reported_at else {
        return false;
    };
    start.map_or(true, |s| reported >= s) && end.map_or(true, |e| reported <= e)
}

/// Count labels, returning the `limit` most frequent.
///
/// Labels are counted in first-seen order and the sort is stable, so equal
/// counts keep the order in which each label first appeared.
fn top_counts<'a, I>(labels: I, limit: usize) -> Vec<LabelCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<LabelCount> = Vec::new();
    for label in labels {
        match counts.iter_mut().find(|c| c.label == label) {
            Some(entry) => entry.count += 1,
            None => counts.push(LabelCount {
                label: label.to_string(),
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

fn root_cause_label(failure: &FailureRecord) -> &str {
    match failure.root_cause.as_deref().map(str::trim) {
        Some(cause) if !cause.is_empty() => cause,
        _ => UNSPECIFIED_ROOT_CAUSE,
    }
}

fn status_label(failure: &FailureRecord) -> &'static str {
    failure.status.as_ref().map_or(UNKNOWN_STATUS, FailureStatus::as_str)
}

// ---------------------------------------------------------------------------
// Report generation
// ---------------------------------------------------------------------------

/// Build a statistical report, or `None` when there is nothing to report.
///
/// With either bound given, only failures reported within the inclusive
/// window are considered (open-ended on the missing side); failures without
/// a valid report timestamp are dropped. Without bounds every failure is
/// kept.
pub fn generate_statistical_report(
    failures: &[FailureRecord],
    period_start: Option<Timestamp>,
    period_end: Option<Timestamp>,
) -> Option<FailureReport> {
    if failures.is_empty() {
        return None;
    }

    let bounded = period_start.is_some() || period_end.is_some();
    let selected: Vec<&FailureRecord> = if bounded {
        failures
            .iter()
            .filter(|f| in_period(f, period_start, period_end))
            .collect()
    } else {
        failures.iter().collect()
    };

    if selected.is_empty() {
        tracing::debug!(
            total = failures.len(),
            "No failures inside the requested report period"
        );
        return None;
    }

    let downtimes: Vec<f64> = selected.iter().filter_map(|f| f.downtime_hours).collect();
    let total_downtime_hours: f64 = downtimes.iter().sum();
    let mean_repair_hours = if downtimes.is_empty() {
        0.0
    } else {
        total_downtime_hours / downtimes.len() as f64
    };
    let total_repair_cost: f64 = selected.iter().filter_map(|f| f.repair_cost).sum();

    Some(FailureReport {
        period_start,
        period_end,
        total_failures: selected.len(),
        mean_repair_hours,
        total_downtime_hours,
        total_repair_cost,
        root_causes: top_counts(selected.iter().map(|f| root_cause_label(f)), TOP_N),
        status_distribution: top_counts(selected.iter().map(|f| status_label(f)), TOP_N),
    })
}

/// Build a report straight from stored field-mappings.
pub fn generate_statistical_report_from_fields(
    failures: &[Value],
    period_start: Option<Timestamp>,
    period_end: Option<Timestamp>,
) -> Result<Option<FailureReport>, CoreError> {
    let failures = failures_from_fields(failures)?;
    Ok(generate_statistical_report(
        &failures,
        period_start,
        period_end,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_timestamp;
    use serde_json::json;

    fn ts(s: &str) -> Timestamp {
        parse_timestamp(s).unwrap()
    }

    fn failure(reported: &str, cause: Option<&str>) -> FailureRecord {
        let mut f = FailureRecord::new(ts(reported));
        f.root_cause = cause.map(str::to_string);
        f
    }

    // -- empty inputs --

    #[test]
    fn empty_input_has_no_report() {
        assert!(generate_statistical_report(&[], None, None).is_none());
        assert!(generate_statistical_report(&[], Some(ts("2024-01-01")), None).is_none());
    }

    #[test]
    fn everything_outside_period_has_no_report() {
        let failures = vec![failure("2023-12-01", None), failure("2024-03-01", None)];
        let report = generate_statistical_report(
            &failures,
            Some(ts("2024-01-01")),
            Some(ts("2024-01-31")),
        );
        assert!(report.is_none());
    }

    // -- period filtering --

    #[test]
    fn bounds_are_inclusive() {
        let failures = vec![
            failure("2024-01-01T00:00:00", None),
            failure("2024-01-15T00:00:00", None),
            failure("2024-01-31T00:00:00", None),
            failure("2024-01-31T00:00:01", None),
        ];
        let report = generate_statistical_report(
            &failures,
            Some(ts("2024-01-01")),
            Some(ts("2024-01-31")),
        )
        .unwrap();
        assert_eq!(report.total_failures, 3);
        assert_eq!(report.period_start, Some(ts("2024-01-01")));
        assert_eq!(report.period_end, Some(ts("2024-01-31")));
    }

    #[test]
    fn single_bound_is_open_ended() {
        let failures = vec![
            failure("2023-06-01", None),
            failure("2024-06-01", None),
            failure("2025-06-01", None),
        ];
        let from = generate_statistical_report(&failures, Some(ts("2024-01-01")), None).unwrap();
        assert_eq!(from.total_failures, 2);
        let until = generate_statistical_report(&failures, None, Some(ts("2024-01-01"))).unwrap();
        assert_eq!(until.total_failures, 1);
    }

    #[test]
    fn undated_failures_dropped_only_when_bounded() {
        let mut undated = failure("2024-01-10", None);
        undated.reported_at = None;
        let failures = vec![undated, failure("2024-01-10", None)];

        let bounded =
            generate_statistical_report(&failures, Some(ts("2024-01-01")), None).unwrap();
        assert_eq!(bounded.total_failures, 1);

        let unbounded = generate_statistical_report(&failures, None, None).unwrap();
        assert_eq!(unbounded.total_failures, 2);
    }

    // -- aggregates --

    #[test]
    fn downtime_and_cost_aggregates() {
        let mut a = failure("2024-01-01", None);
        a.downtime_hours = Some(2.0);
        a.repair_cost = Some(100.0);
        let mut b = failure("2024-01-02", None);
        b.downtime_hours = Some(6.0);
        b.repair_cost = None;
        let mut c = failure("2024-01-03", None);
        c.downtime_hours = None;
        c.repair_cost = Some(50.0);

        let report = generate_statistical_report(&[a, b, c], None, None).unwrap();
        assert_eq!(report.total_failures, 3);
        assert_eq!(report.mean_repair_hours, 4.0);
        assert_eq!(report.total_downtime_hours, 8.0);
        assert_eq!(report.total_repair_cost, 150.0);
    }

    #[test]
    fn no_downtime_values_gives_zero_mean() {
        let mut a = failure("2024-01-01", None);
        a.downtime_hours = None;
        let report = generate_statistical_report(&[a], None, None).unwrap();
        assert_eq!(report.mean_repair_hours, 0.0);
        assert_eq!(report.total_downtime_hours, 0.0);
        assert_eq!(report.total_repair_cost, 0.0);
    }

    // -- frequency tables --

    #[test]
    fn missing_or_blank_cause_goes_to_unspecified() {
        let failures = vec![
            failure("2024-01-01", None),
            failure("2024-01-02", Some("  ")),
            failure("2024-01-03", Some("Desgaste")),
        ];
        let report = generate_statistical_report(&failures, None, None).unwrap();
        assert_eq!(
            report.root_causes[0],
            LabelCount {
                label: UNSPECIFIED_ROOT_CAUSE.to_string(),
                count: 2
            }
        );
        assert_eq!(report.root_causes[1].label, "Desgaste");
    }

    #[test]
    fn root_causes_limited_to_top_five_with_first_seen_ties() {
        let causes = ["A", "B", "C", "D", "E", "F", "G", "G"];
        let failures: Vec<FailureRecord> = causes
            .iter()
            .enumerate()
            .map(|(i, c)| failure(&format!("2024-01-{:02}", i + 1), Some(*c)))
            .collect();
        let report = generate_statistical_report(&failures, None, None).unwrap();
        let labels: Vec<&str> = report.root_causes.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["G", "A", "B", "C", "D"]);
        assert_eq!(report.root_causes[0].count, 2);
    }

    #[test]
    fn status_distribution_counts_stored_labels() {
        let mut a = failure("2024-01-01", None);
        a.status = Some(FailureStatus::Resolved);
        let mut b = failure("2024-01-02", None);
        b.status = Some(FailureStatus::Resolved);
        let c = failure("2024-01-03", None);

        let report = generate_statistical_report(&[c, a, b], None, None).unwrap();
        assert_eq!(report.status_distribution.len(), 2);
        assert_eq!(report.status_distribution[0].label, "Resuelta");
        assert_eq!(report.status_distribution[0].count, 2);
        assert_eq!(report.status_distribution[1].label, "Reportada");
    }

    #[test]
    fn status_distribution_limited_to_top_five_with_first_seen_ties() {
        use FailureStatus::*;
        // Closed leads with two; the other five statuses tie on one and only
        // the first four seen make the table.
        let statuses = [Invalid, Closed, UnderRepair, Reported, Closed, Resolved, UnderReview];
        let failures: Vec<FailureRecord> = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let mut f = failure(&format!("2024-01-{:02}", i + 1), None);
                f.status = Some(*status);
                f
            })
            .collect();

        let report = generate_statistical_report(&failures, None, None).unwrap();
        let labels: Vec<&str> = report
            .status_distribution
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(
            labels,
            vec!["Cerrada", "Inválida", "En Reparación", "Reportada", "Resuelta"]
        );
        assert_eq!(report.status_distribution[0].count, 2);
        assert!(report.status_distribution[1..].iter().all(|c| c.count == 1));
    }

    #[test]
    fn missing_status_is_reported_as_unknown() {
        let mut unlabelled = failure("2024-01-01", None);
        unlabelled.status = None;
        let report =
            generate_statistical_report(&[unlabelled, failure("2024-01-02", None)], None, None)
                .unwrap();
        assert_eq!(
            report.status_distribution,
            vec![
                LabelCount {
                    label: UNKNOWN_STATUS.to_string(),
                    count: 1
                },
                LabelCount {
                    label: "Reportada".to_string(),
                    count: 1
                },
            ]
        );

        let rows = vec![json!({ "fecha_reporte": "2024-01-01" })];
        let report = generate_statistical_report_from_fields(&rows, None, None)
            .unwrap()
            .unwrap();
        assert_eq!(report.status_distribution[0].label, UNKNOWN_STATUS);
    }

    #[test]
    fn report_serializes_with_stored_keys() {
        let report = generate_statistical_report(&[failure("2024-01-01", None)], None, None)
            .unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert!(value["periodo_inicio"].is_null());
        assert_eq!(value["total_fallas"], 1);
        assert_eq!(value["causas_raiz"][0]["label"], UNSPECIFIED_ROOT_CAUSE);
        assert_eq!(value["distribucion_por_estado"][0]["count"], 1);
    }

    // -- from fields --

    #[test]
    fn from_fields_ignores_wrong_types_in_unread_fields() {
        let rows = vec![
            json!({ "fecha_reporte": "2024-01-01", "estado": "Resuelta", "tiempo_fuera_servicio_h": 2.0, "causa_raiz": "Desgaste" }),
            json!({ "fecha_reporte": "2024-01-03", "estado": "Reportada", "prioridad": 2.0, "descripcion": 5, "reportada_por": false }),
        ];
        let report = generate_statistical_report_from_fields(&rows, None, None)
            .unwrap()
            .unwrap();
        assert_eq!(report.total_failures, 2);
        assert_eq!(report.total_downtime_hours, 2.0);
        assert_eq!(report.root_causes[0].label, "Desgaste");
    }

    #[test]
    fn from_fields_tolerates_malformed_dates_in_bounded_query() {
        let rows = vec![
            json!({ "fecha_reporte": "2024-01-05", "causa_raiz": "Sobrecarga" }),
            json!({ "fecha_reporte": "fecha rota" }),
            json!({ "causa_raiz": "Sin fecha" }),
        ];
        let report =
            generate_statistical_report_from_fields(&rows, Some(ts("2024-01-01")), None)
                .unwrap()
                .unwrap();
        assert_eq!(report.total_failures, 1);
        assert_eq!(report.root_causes[0].label, "Sobrecarga");
    }
}
