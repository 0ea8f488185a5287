//! `upkeep-kpi` -- batch reliability metrics over a record snapshot.
//!
//! Reads the failure and work-order history of one asset from a JSON
//! snapshot and prints either its KPIs or a statistical failure report as
//! JSON on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```text
//! upkeep-kpi [kpis|report]
//! ```
//!
//! # Environment variables
//!
//! | Variable              | Required | Default | Description                               |
//! |-----------------------|----------|---------|-------------------------------------------|
//! | `UPKEEP_INPUT`        | yes      | --      | Path to the snapshot JSON file            |
//! | `UPKEEP_COMMAND`      | no       | `kpis`  | `kpis` or `report` (CLI argument wins)    |
//! | `REPORT_PERIOD_START` | no       | --      | Inclusive lower bound for `report`        |
//! | `REPORT_PERIOD_END`   | no       | --      | Inclusive upper bound for `report`        |

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use upkeep_kpi::config::KpiConfig;
use upkeep_kpi::snapshot::load_snapshot;

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "upkeep_kpi=info,upkeep_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let command_arg = std::env::args().nth(1);
    let config = KpiConfig::from_env(command_arg.as_deref()).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(2);
    });

    tracing::info!(
        input = %config.input_path.display(),
        command = config.command.as_str(),
        "Starting upkeep-kpi",
    );

    if let Err(e) = run(&config) {
        tracing::error!(error = ?e, "upkeep-kpi failed");
        std::process::exit(1);
    }
}

fn run(config: &KpiConfig) -> anyhow::Result<()> {
    let snapshot = load_snapshot(&config.input_path)?;
    let output = upkeep_kpi::execute(config, &snapshot)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
