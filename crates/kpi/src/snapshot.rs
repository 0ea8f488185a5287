//! Snapshot files exported by the record store.
//!
//! A snapshot holds the failure and work-order rows of one asset as JSON:
//!
//! ```json
//! { "fallas": [ { "fecha_reporte": "2024-01-01T00:00:00", "estado": "Resuelta" } ],
//!   "ordenes_trabajo": [ { "tipo": "Preventivo", "estado": "Completada" } ] }
//! ```
//!
//! Rows stay as raw field-mappings here; `upkeep_core::fields` converts them.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "fallas", default)]
    pub failures: Vec<Value>,
    /// `None` when the export carried no work-order section at all.
    #[serde(rename = "ordenes_trabajo", default)]
    pub work_orders: Option<Vec<Value>>,
}

/// Parse a snapshot from JSON text.
pub fn parse_snapshot(text: &str) -> anyhow::Result<Snapshot> {
    serde_json::from_str(text).context("snapshot is not a valid JSON document")
}

/// Read and parse a snapshot file.
pub fn load_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let snapshot = parse_snapshot(&text)
        .with_context(|| format!("failed to parse snapshot {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        failures = snapshot.failures.len(),
        work_orders = snapshot.work_orders.as_ref().map_or(0, Vec::len),
        "Snapshot loaded",
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_sections_are_read() {
        let snapshot = parse_snapshot(
            r#"{ "fallas": [{ "estado": "Resuelta" }], "ordenes_trabajo": [{ "tipo": "Otro" }] }"#,
        )
        .unwrap();
        assert_eq!(snapshot.failures.len(), 1);
        assert_eq!(snapshot.work_orders.map(|w| w.len()), Some(1));
    }

    #[test]
    fn missing_work_orders_section_is_none() {
        let snapshot = parse_snapshot(r#"{ "fallas": [] }"#).unwrap();
        assert!(snapshot.failures.is_empty());
        assert!(snapshot.work_orders.is_none());
    }

    #[test]
    fn empty_object_is_an_empty_snapshot() {
        let snapshot = parse_snapshot("{}").unwrap();
        assert!(snapshot.failures.is_empty());
        assert!(snapshot.work_orders.is_none());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse_snapshot("{ fallas: ").is_err());
        assert!(parse_snapshot(r#"{ "fallas": 3 }"#).is_err());
    }
}
