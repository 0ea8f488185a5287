use std::path::PathBuf;

use upkeep_core::types::{parse_timestamp, Timestamp};

/// What the binary computes from the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Asset KPIs (MTBF, MTTR, availability, compliance, cost).
    Kpis,
    /// Statistical failure report over the configured period.
    Report,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kpis => "kpis",
            Self::Report => "report",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kpis" => Ok(Self::Kpis),
            "report" => Ok(Self::Report),
            _ => Err(ConfigError::Invalid {
                var: "UPKEEP_COMMAND",
                value: s.to_string(),
                expected: "one of: kpis, report",
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var}='{value}' is invalid, expected {expected}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Batch configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct KpiConfig {
    /// Snapshot file holding the failure and work-order rows.
    pub input_path: PathBuf,
    pub command: Command,
    pub period_start: Option<Timestamp>,
    pub period_end: Option<Timestamp>,
}

impl KpiConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var               | Default |
    /// |-----------------------|---------|
    /// | `UPKEEP_INPUT`        | --      |
    /// | `UPKEEP_COMMAND`      | `kpis`  |
    /// | `REPORT_PERIOD_START` | unset   |
    /// | `REPORT_PERIOD_END`   | unset   |
    ///
    /// `command_arg` (the first CLI argument) overrides `UPKEEP_COMMAND`.
    pub fn from_env(command_arg: Option<&str>) -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok(), command_arg)
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F, command_arg: Option<&str>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let input_path = lookup("UPKEEP_INPUT")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing("UPKEEP_INPUT"))?;

        let command = match command_arg.map(str::to_string).or_else(|| lookup("UPKEEP_COMMAND")) {
            Some(value) => Command::from_str(&value)?,
            None => Command::Kpis,
        };

        let period_start = optional_timestamp(&lookup, "REPORT_PERIOD_START")?;
        let period_end = optional_timestamp(&lookup, "REPORT_PERIOD_END")?;

        if let (Some(start), Some(end)) = (period_start, period_end) {
            if start > end {
                return Err(ConfigError::Invalid {
                    var: "REPORT_PERIOD_END",
                    value: end.to_string(),
                    expected: "a timestamp not before REPORT_PERIOD_START",
                });
            }
        }

        Ok(Self {
            input_path,
            command,
            period_start,
            period_end,
        })
    }
}

fn optional_timestamp<F>(lookup: &F, var: &'static str) -> Result<Option<Timestamp>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var).filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(value) => parse_timestamp(&value)
            .map(Some)
            .ok_or(ConfigError::Invalid {
                var,
                value,
                expected: "an ISO-8601 date or date-time",
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_kpis_without_period() {
        let config = KpiConfig::from_lookup(lookup(&[("UPKEEP_INPUT", "data.json")]), None).unwrap();
        assert_eq!(config.input_path, PathBuf::from("data.json"));
        assert_eq!(config.command, Command::Kpis);
        assert!(config.period_start.is_none());
        assert!(config.period_end.is_none());
    }

    #[test]
    fn missing_input_is_an_error() {
        assert_matches!(
            KpiConfig::from_lookup(lookup(&[]), None),
            Err(ConfigError::Missing("UPKEEP_INPUT"))
        );
    }

    #[test]
    fn cli_argument_overrides_env_command() {
        let vars = [("UPKEEP_INPUT", "data.json"), ("UPKEEP_COMMAND", "kpis")];
        let config = KpiConfig::from_lookup(lookup(&vars), Some("report")).unwrap();
        assert_eq!(config.command, Command::Report);
    }

    #[test]
    fn unknown_command_is_rejected() {
        let vars = [("UPKEEP_INPUT", "data.json"), ("UPKEEP_COMMAND", "export")];
        assert_matches!(
            KpiConfig::from_lookup(lookup(&vars), None),
            Err(ConfigError::Invalid { var: "UPKEEP_COMMAND", .. })
        );
    }

    #[test]
    fn period_bounds_are_parsed() {
        let vars = [
            ("UPKEEP_INPUT", "data.json"),
            ("REPORT_PERIOD_START", "2024-01-01"),
            ("REPORT_PERIOD_END", "2024-01-31T23:59:59"),
        ];
        let config = KpiConfig::from_lookup(lookup(&vars), Some("report")).unwrap();
        assert_eq!(config.period_start, parse_timestamp("2024-01-01"));
        assert_eq!(config.period_end, parse_timestamp("2024-01-31T23:59:59"));
    }

    #[test]
    fn unparseable_period_is_rejected() {
        let vars = [("UPKEEP_INPUT", "data.json"), ("REPORT_PERIOD_START", "last week")];
        assert_matches!(
            KpiConfig::from_lookup(lookup(&vars), None),
            Err(ConfigError::Invalid { var: "REPORT_PERIOD_START", .. })
        );
    }

    #[test]
    fn inverted_period_is_rejected() {
        let vars = [
            ("UPKEEP_INPUT", "data.json"),
            ("REPORT_PERIOD_START", "2024-02-01"),
            ("REPORT_PERIOD_END", "2024-01-01"),
        ];
        assert!(KpiConfig::from_lookup(lookup(&vars), None).is_err());
    }

    #[test]
    fn command_names_round_trip() {
        for command in [Command::Kpis, Command::Report] {
            assert_eq!(Command::from_str(command.as_str()).unwrap(), command);
        }
    }
}
