//! Periodic orchestration loop.

use std::path::Path;
use std::time::Duration;

use tracing::{error, info, warn};

use scalegrid_core::{ExecutionContext, OrchestrationStatus};
use scalegrid_orchestrator::ScalabilityOrchestrator;

use crate::commands::load_snapshot;

/// Run one infinite-scaling cycle per tick until the context is cancelled
/// (or once, with `once`). The snapshot is reloaded every tick; a tick whose
/// snapshot cannot be loaded is skipped. Returns the number of cycles run.
pub async fn run_cycles(
    orchestrator: &ScalabilityOrchestrator,
    snapshot_path: &Path,
    interval: Duration,
    once: bool,
    ctx: &ExecutionContext,
) -> usize {
    info!(
        interval_secs = interval.as_secs(),
        snapshot = %snapshot_path.display(),
        "control loop started"
    );
    let mut cycles = 0;

    loop {
        if ctx.is_cancelled() {
            break;
        }

        match load_snapshot(snapshot_path) {
            Ok(snapshot) => {
                let report = orchestrator
                    .orchestrate_infinite_scaling(&snapshot.into_request(), ctx)
                    .await;
                cycles += 1;
                match report.status {
                    OrchestrationStatus::Failed => error!(
                        cycle = cycles,
                        orchestration = %report.orchestration_id,
                        "cycle failed"
                    ),
                    status => info!(
                        cycle = cycles,
                        orchestration = %report.orchestration_id,
                        status = %status,
                        actions = report.plan.scaling_actions.len(),
                        "cycle finished"
                    ),
                }
            }
            Err(e) => {
                let reason = format!("{e:#}");
                warn!(error = %reason, "skipping cycle");
            }
        }

        if once {
            break;
        }

        let mut cancel = ctx.cancel_signal();
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.cancelled() => {
                info!("control loop shutting down");
                break;
            }
        }
    }
    cycles
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use scalegrid_core::cancel_pair;

    use super::*;

    const SNAPSHOT: &str = r#"{
        "resource_metrics": [
            {"resource_type": "cpu", "current_usage": 85.0, "capacity": 100.0,
             "utilization_percentage": 85.0}
        ],
        "nodes": [
            {"node_id": "n1", "capacity": 100.0, "current_load": 0.0,
             "response_time": 20.0, "health_status": "healthy"}
        ],
        "total_workload": 50.0
    }"#;

    fn snapshot_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{SNAPSHOT}").unwrap();
        file
    }

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(2, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn once_runs_a_single_cycle() {
        let file = snapshot_file();
        let orchestrator = ScalabilityOrchestrator::default();
        let cycles =
            run_cycles(&orchestrator, file.path(), Duration::from_secs(60), true, &ctx()).await;

        assert_eq!(cycles, 1);
        assert_eq!(orchestrator.scaling_analytics().await.total_actions, 1);
    }

    #[tokio::test]
    async fn cancel_stops_the_loop() {
        let file = snapshot_file();
        let orchestrator = ScalabilityOrchestrator::default();
        let (handle, signal) = cancel_pair();
        let ctx = ctx().with_cancel(signal);

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.cancel();
        });
        let cycles =
            run_cycles(&orchestrator, file.path(), Duration::from_secs(60), false, &ctx).await;
        canceller.await.unwrap();

        assert_eq!(cycles, 1);
    }

    #[tokio::test]
    async fn unreadable_snapshot_skips_the_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = ScalabilityOrchestrator::default();
        let cycles = run_cycles(
            &orchestrator,
            &dir.path().join("missing.json"),
            Duration::from_secs(60),
            true,
            &ctx(),
        )
        .await;

        assert_eq!(cycles, 0);
        assert!(orchestrator.history().orchestrations().await.is_empty());
    }
}
