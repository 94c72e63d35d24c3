//! Performance optimizer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use scalegrid_core::actuator::noop_optimize_fn;
use scalegrid_core::*;

/// Flags metrics that miss their targets and applies the remedies.
pub struct PerformanceOptimizer {
    targets: BTreeMap<PerformanceMetric, f64>,
    tolerance: f64,
    optimize_fn: OptimizeFn,
}

impl Default for PerformanceOptimizer {
    fn default() -> Self {
        Self::with_targets(OptimizerConfig::stock_targets(), DEFAULT_TOLERANCE)
    }
}

impl PerformanceOptimizer {
    /// Create an optimizer from the `[optimizer]` config section.
    pub fn new(config: &OptimizerConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_targets(config.target_table()?, config.tolerance))
    }

    pub fn with_targets(targets: BTreeMap<PerformanceMetric, f64>, tolerance: f64) -> Self {
        Self {
            targets,
            tolerance,
            optimize_fn: noop_optimize_fn(),
        }
    }

    /// Set the callback used to apply optimization actions.
    pub fn with_optimize_fn(mut self, f: OptimizeFn) -> Self {
        self.optimize_fn = f;
        self
    }

    /// Optimal value for `metric`, if one is configured.
    pub fn target_for(&self, metric: PerformanceMetric) -> Option<f64> {
        self.targets.get(&metric).copied()
    }

    /// Return a target for every metric outside its tolerance band, highest
    /// priority first.
    pub fn analyze_performance(
        &self,
        metrics: &BTreeMap<PerformanceMetric, f64>,
    ) -> Vec<PerformanceTarget> {
        let mut targets = Vec::new();

        for (&metric, &current) in metrics {
            if !current.is_finite() {
                warn!(metric = %metric, "skipping non-finite performance reading");
                continue;
            }
            // No configured target: the current value is taken as optimal.
            let Some(target_value) = self.target_for(metric) else {
                continue;
            };
            if !needs_optimization(metric, current, target_value, self.tolerance) {
                continue;
            }

            let priority = deviation_priority(current, target_value);
            debug!(
                metric = %metric,
                current,
                target = target_value,
                priority,
                "performance target missed"
            );
            targets.push(PerformanceTarget {
                metric,
                target_value,
                current_value: current,
                tolerance: self.tolerance,
                priority,
                optimization_actions: remedies_for(metric),
            });
        }

        targets.sort_by(|a, b| b.priority.cmp(&a.priority));
        targets
    }

    /// Run every target's remedies through the optimize callback.
    ///
    /// A target is judged on its own `current_value` only; no fresh reading
    /// is taken. Targets already inside their band are recorded as skipped
    /// without calling the actuator. Callers that resubmit targets must
    /// refresh `current_value` first, or every remedy runs again.
    pub async fn optimize_performance(
        &self,
        targets: &[PerformanceTarget],
        ctx: &ExecutionContext,
    ) -> OptimizationReport {
        let mut pending = Vec::new();
        let mut satisfied = Vec::with_capacity(targets.len());
        for target in targets {
            let ok = !needs_optimization(
                target.metric,
                target.current_value,
                target.target_value,
                target.tolerance,
            );
            satisfied.push(ok);
            if ok {
                debug!(metric = %target.metric, "target already satisfied, skipping");
                continue;
            }
            for action in &target.optimization_actions {
                pending.push((
                    format!("{}: {}", target.metric, action),
                    (target.metric, action.clone()),
                ));
            }
        }

        let optimize_fn = self.optimize_fn.clone();
        let results = ctx
            .run_bounded(pending, move |(metric, action): (PerformanceMetric, String)| {
                let optimize_fn = optimize_fn.clone();
                Box::pin(async move { optimize_fn(metric, action).await })
            })
            .await;

        let mut results = results.into_iter();
        let mut records = Vec::new();
        for (target, satisfied) in targets.iter().zip(satisfied) {
            for action in &target.optimization_actions {
                let (outcome, improvement) = if satisfied {
                    (ActionOutcome::Skipped, 0.0)
                } else {
                    match results.next() {
                        Some(Ok(improvement)) => (ActionOutcome::Completed, improvement),
                        Some(Err(failure)) => {
                            warn!(error = %failure, "optimization action failed");
                            (ActionOutcome::from(&failure), 0.0)
                        }
                        None => (
                            ActionOutcome::Failed {
                                error: "no result recorded".to_string(),
                            },
                            0.0,
                        ),
                    }
                };
                records.push(OptimizationRecord {
                    metric: target.metric,
                    action: action.clone(),
                    outcome,
                    improvement,
                    recorded_at: epoch_secs(),
                });
            }
        }

        let report = OptimizationReport::from_records(targets.len(), records, ctx.is_cancelled());
        info!(
            targets = report.total_targets,
            succeeded = report.successful_optimizations,
            failed = report.failed_optimizations,
            cancelled = report.cancelled,
            "optimization pass finished"
        );
        report
    }
}

/// Whether `current` falls outside the tolerance band around `target`.
pub fn needs_optimization(
    metric: PerformanceMetric,
    current: f64,
    target: f64,
    tolerance: f64,
) -> bool {
    if metric.lower_is_better() {
        current > target * (1.0 + tolerance)
    } else {
        current < target * (1.0 - tolerance)
    }
}

/// Priority (4–10) from the relative deviation of `current` from `target`.
pub fn deviation_priority(current: f64, target: f64) -> u8 {
    let deviation = if target == 0.0 {
        0.0
    } else {
        (current - target).abs() / target
    };
    if deviation > 0.5 {
        10
    } else if deviation > 0.3 {
        8
    } else if deviation > 0.1 {
        6
    } else {
        4
    }
}

/// Remedy list for a metric.
pub fn remedies_for(metric: PerformanceMetric) -> Vec<String> {
    let actions: &[&str] = match metric {
        PerformanceMetric::ResponseTime => &["Optimize database queries", "Implement caching"],
        PerformanceMetric::Throughput => &["Scale out instances", "Optimize load balancing"],
        PerformanceMetric::CpuUtilization => &["Optimize algorithms", "Scale CPU resources"],
        PerformanceMetric::ErrorRate => &["Improve error handling", "Fix application bugs"],
        PerformanceMetric::Availability => &["Implement redundancy", "Improve monitoring"],
        PerformanceMetric::MemoryUtilization => &["General optimization"],
    };
    actions.iter().map(|a| a.to_string()).collect()
}

/// Result of one optimization action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRecord {
    pub metric: PerformanceMetric,
    pub action: String,
    pub outcome: ActionOutcome,
    /// Improvement (%) reported by the actuator; 0 unless completed.
    pub improvement: f64,
    pub recorded_at: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub total_targets: usize,
    pub records: Vec<OptimizationRecord>,
    pub successful_optimizations: usize,
    pub failed_optimizations: usize,
    pub cancelled: bool,
}

impl OptimizationReport {
    pub fn from_records(
        total_targets: usize,
        records: Vec<OptimizationRecord>,
        cancelled: bool,
    ) -> Self {
        let successful = records.iter().filter(|r| r.outcome.is_success()).count();
        let cancelled = cancelled || records.iter().any(|r| r.outcome.is_cancelled());
        Self {
            total_targets,
            successful_optimizations: successful,
            failed_optimizations: records.len() - successful,
            records,
            cancelled,
        }
    }

    pub fn status(&self) -> OrchestrationStatus {
        OrchestrationStatus::from_counts(
            self.records.len(),
            self.successful_optimizations,
            self.cancelled,
        )
    }
}
