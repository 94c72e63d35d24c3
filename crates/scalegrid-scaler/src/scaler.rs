//! Resource scaler: utilization-driven capacity actions.
//!
//! Compares each `ResourceMetrics` reading against the scaling policy for
//! its resource type and emits `ScalingAction`s. The actual resize is
//! performed by a callback supplied by the caller.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use scalegrid_core::actuator::noop_scale_fn;
use scalegrid_core::*;

use crate::analytics::ScalingRecord;

/// Seconds budgeted for a scale-up to settle.
const SCALE_UP_DURATION_SECS: u64 = 120;
/// Seconds budgeted for a scale-down to settle.
const SCALE_DOWN_DURATION_SECS: u64 = 60;
/// Cost per unit of capacity moved.
const UNIT_COST: f64 = 0.1;
/// Performance gain credited to every scale-up.
const SCALE_UP_PERFORMANCE_GAIN: f64 = 25.0;

/// Turns resource utilization readings into scaling actions.
pub struct ResourceScaler {
    policies: PolicyTable<ResourceType, ScalingPolicy>,
    /// A scale-down must keep capacity above `usage * safety_margin`.
    safety_margin: f64,
    scale_fn: ScaleFn,
    sequence: AtomicU64,
}

impl Default for ResourceScaler {
    fn default() -> Self {
        Self::with_policies(ScalerConfig::stock_policies(), DEFAULT_SAFETY_MARGIN)
    }
}

impl ResourceScaler {
    /// Create a scaler from the `[scaler]` config section.
    pub fn new(config: &ScalerConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_policies(
            config.policy_table()?,
            config.safety_margin,
        ))
    }

    pub fn with_policies(
        policies: PolicyTable<ResourceType, ScalingPolicy>,
        safety_margin: f64,
    ) -> Self {
        debug!(
            explicit = ?policies.explicit_keys(),
            safety_margin,
            "resource scaler policies resolved"
        );
        Self {
            policies,
            safety_margin,
            scale_fn: noop_scale_fn(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Set the callback used to apply scaling actions.
    pub fn with_scale_fn(mut self, f: ScaleFn) -> Self {
        self.scale_fn = f;
        self
    }

    pub fn policy(&self, resource_type: ResourceType) -> &ScalingPolicy {
        self.policies.resolve(&resource_type)
    }

    /// Analyze every reading and return the actions it calls for, highest
    /// priority first.
    ///
    /// Malformed readings are skipped. Ties keep resource-type order.
    pub fn analyze_resource_needs(
        &self,
        metrics: &BTreeMap<ResourceType, ResourceMetrics>,
    ) -> Vec<ScalingAction> {
        let mut actions = Vec::new();

        for (resource_type, reading) in metrics {
            if !reading.is_well_formed() {
                warn!(
                    resource = %resource_type,
                    usage = reading.current_usage,
                    capacity = reading.capacity,
                    "skipping malformed resource reading"
                );
                continue;
            }
            if reading.resource_type != *resource_type {
                warn!(
                    resource = %resource_type,
                    reported = %reading.resource_type,
                    "skipping reading filed under the wrong resource type"
                );
                continue;
            }

            if let Some(action) = self.evaluate(reading) {
                actions.push(action);
            }
        }

        // Stable: equal priorities keep discovery order.
        actions.sort_by(|a, b| b.priority.cmp(&a.priority));
        actions
    }

    /// Evaluate a single reading against its policy.
    pub fn evaluate(&self, reading: &ResourceMetrics) -> Option<ScalingAction> {
        let resource_type = reading.resource_type;
        let policy = self.policies.resolve(&resource_type);
        let utilization = reading.utilization_percentage;
        let capacity = reading.capacity;

        if utilization > policy.scale_up_threshold {
            let magnitude = capacity * policy.scale_factor - capacity;
            let priority = calculate_priority(utilization, policy.scale_up_threshold);
            debug!(
                resource = %resource_type,
                utilization,
                threshold = policy.scale_up_threshold,
                magnitude,
                priority,
                "scaling up"
            );
            return Some(ScalingAction {
                action_id: self.next_id(ScalingDirection::Up, resource_type),
                resource_type,
                direction: ScalingDirection::Up,
                magnitude,
                strategy: ScalingStrategy::Reactive,
                priority,
                estimated_duration_secs: SCALE_UP_DURATION_SECS,
                expected_impact: Benefits {
                    performance_improvement: SCALE_UP_PERFORMANCE_GAIN,
                    ..Benefits::default()
                },
                prerequisites: Vec::new(),
                rollback_plan: vec![format!("Scale down {resource_type}")],
                cost_estimate: magnitude * UNIT_COST,
                risk_level: 0.2,
            });
        }

        if utilization < policy.scale_down_threshold {
            let magnitude = capacity - capacity / policy.scale_factor;
            let remaining = capacity - magnitude;
            let floor = reading.current_usage * self.safety_margin;
            if remaining <= floor {
                debug!(
                    resource = %resource_type,
                    utilization,
                    remaining,
                    floor,
                    "scale-down would breach safety margin, holding"
                );
                return None;
            }

            let priority = calculate_priority(100.0 - utilization, 100.0 - policy.scale_down_threshold);
            debug!(
                resource = %resource_type,
                utilization,
                threshold = policy.scale_down_threshold,
                magnitude,
                priority,
                "scaling down"
            );
            return Some(ScalingAction {
                action_id: self.next_id(ScalingDirection::Down, resource_type),
                resource_type,
                direction: ScalingDirection::Down,
                magnitude,
                strategy: ScalingStrategy::Reactive,
                priority,
                estimated_duration_secs: SCALE_DOWN_DURATION_SECS,
                expected_impact: Benefits {
                    cost_optimization: magnitude * UNIT_COST,
                    ..Benefits::default()
                },
                prerequisites: vec!["Verify no active workloads affected".to_string()],
                rollback_plan: vec![format!("Scale up {resource_type}")],
                cost_estimate: -magnitude * UNIT_COST,
                risk_level: 0.3,
            });
        }

        None
    }

    /// Apply one action through the scale callback.
    ///
    /// Failures, timeouts, and cancellation are returned as-is; nothing is
    /// retried.
    pub async fn execute_scaling_action(
        &self,
        action: &ScalingAction,
        ctx: &ExecutionContext,
    ) -> Result<ScalingRecord, ExecutionFailure> {
        let fut = (self.scale_fn)(action.clone());
        match ctx.run_one(&action.action_id, fut).await {
            Ok(()) => {
                info!(
                    action = %action.action_id,
                    resource = %action.resource_type,
                    direction = %action.direction,
                    magnitude = action.magnitude,
                    "scaling action applied"
                );
                Ok(ScalingRecord::from_action(action))
            }
            Err(failure) => {
                warn!(error = %failure, "scaling action failed");
                Err(failure)
            }
        }
    }

    /// Apply a batch of actions on the bounded pool. Results line up with
    /// `actions`.
    pub async fn execute_scaling_actions(
        &self,
        actions: &[ScalingAction],
        ctx: &ExecutionContext,
    ) -> Vec<Result<ScalingRecord, ExecutionFailure>> {
        let items = actions
            .iter()
            .map(|action| (action.action_id.clone(), action.clone()))
            .collect();
        let scale_fn = self.scale_fn.clone();

        let results = ctx
            .run_bounded(items, move |action: ScalingAction| {
                let scale_fn = scale_fn.clone();
                Box::pin(async move {
                    scale_fn(action.clone()).await?;
                    Ok(ScalingRecord::from_action(&action))
                })
            })
            .await;

        for result in &results {
            match result {
                Ok(record) => debug!(action = %record.action_id, "scaling action applied"),
                Err(failure) => warn!(error = %failure, "scaling action failed"),
            }
        }
        results
    }

    fn next_id(&self, direction: ScalingDirection, resource_type: ResourceType) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("scale-{direction}-{resource_type}-{seq}")
    }
}

/// Priority (4–10) for how far `severity` overshoots `threshold`.
pub fn calculate_priority(severity: f64, threshold: f64) -> u8 {
    if severity > threshold * 1.5 {
        10
    } else if severity > threshold * 1.2 {
        8
    } else if severity > threshold {
        6
    } else {
        4
    }
}
