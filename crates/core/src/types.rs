use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Primary keys assigned by the record store.
pub type DbId = i64;

/// Record timestamps as stored by the maintenance history (no zone; UTC by
/// convention).
pub type Timestamp = NaiveDateTime;

/// Parse an ISO-8601 timestamp as written by the record store.
///
/// Accepts `YYYY-MM-DDTHH:MM:SS[.fff]`, the same with a space separator, an
/// RFC 3339 string with offset (normalized to UTC), `YYYY-MM-DDTHH:MM`, or a
/// bare `YYYY-MM-DD` (midnight). Returns `None` for anything else.
///
/// # Examples
///
/// ```
/// use upkeep_core::types::parse_timestamp;
///
/// let ts = parse_timestamp("2024-01-05").unwrap();
/// assert_eq!(ts.to_string(), "2024-01-05 00:00:00");
/// assert!(parse_timestamp("yesterday").is_none());
/// ```
pub fn parse_timestamp(value: &str) -> Option<Timestamp> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(ts) = value.parse::<NaiveDateTime>() {
        return Some(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M") {
        return Some(ts);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Fold a stored enum label into a comparison key.
///
/// Lowercases, strips Spanish accents and turns spaces/hyphens into
/// underscores, so `"En Revisión"`, `"EN REVISION"` and `"en_revision"`
/// all compare equal.
pub(crate) fn fold_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            ' ' | '-' => '_',
            other => other,
        })
        .collect()
}
