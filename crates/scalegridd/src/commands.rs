//! Subcommand implementations.

use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};

use scalegrid_core::{ScalabilityPlan, ScalegridConfig, WorkloadDistribution, cancel_pair};
use scalegrid_orchestrator::{ScalabilityOrchestrator, Snapshot};

use crate::control_loop;

/// Used when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG_PATH: &str = "scalegrid.toml";

/// Output of `scalegridd plan`.
#[derive(Debug, Serialize)]
pub struct PlanPreview {
    pub plan: ScalabilityPlan,
    pub distribution: Option<WorkloadDistribution>,
    pub distribution_error: Option<String>,
}

/// Load the config. An explicit path must exist; without one the default
/// path is tried and stock policies are used when it is absent.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ScalegridConfig> {
    let config = match path {
        Some(path) => ScalegridConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                ScalegridConfig::from_file(default)
                    .with_context(|| format!("loading config {DEFAULT_CONFIG_PATH}"))?
            } else {
                info!("no config file, using stock policies");
                ScalegridConfig::default()
            }
        }
    };
    Ok(config)
}

pub fn load_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    Snapshot::from_json(&content).with_context(|| format!("parsing snapshot {}", path.display()))
}

pub async fn plan(snapshot_path: &Path, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let orchestrator = ScalabilityOrchestrator::new(&config)?;
    let request = load_snapshot(snapshot_path)?.into_request();

    let plan = orchestrator
        .orchestrate_scalability(&request.resource_metrics, &request.performance_metrics)
        .await;
    let (distribution, distribution_error) =
        match orchestrator.preview_distribution(&request.nodes, request.total_workload, request.strategy) {
            Ok(distribution) => (Some(distribution), None),
            Err(e) => {
                warn!(error = %e, "no workload distribution");
                (None, Some(e.to_string()))
            }
        };

    let preview = PlanPreview {
        plan,
        distribution,
        distribution_error,
    };
    println!("{}", serde_json::to_string_pretty(&preview)?);
    Ok(())
}

pub async fn run(
    snapshot_path: &Path,
    config_path: Option<&Path>,
    interval_secs: u64,
    once: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let orchestrator = ScalabilityOrchestrator::new(&config)?;

    let (cancel, signal) = cancel_pair();
    let ctx = orchestrator.execution_context().with_cancel(signal);

    let ctrl_c = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                cancel.cancel();
            }
            Err(e) => warn!(error = %e, "failed to install Ctrl-C handler"),
        }
    });

    let cycles = control_loop::run_cycles(
        &orchestrator,
        snapshot_path,
        std::time::Duration::from_secs(interval_secs),
        once,
        &ctx,
    )
    .await;
    ctrl_c.abort();

    info!(cycles, "scalegridd stopped");
    let analytics = orchestrator.analytics().await;
    println!("{}", serde_json::to_string_pretty(&analytics)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn loads_explicit_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[executor]\nmax_concurrency = 2").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.executor.max_concurrency, 2);
    }

    #[test]
    fn snapshot_errors_name_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = load_snapshot(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing snapshot"));
    }
}
