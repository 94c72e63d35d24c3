//! Scalability plan assembly.

use std::collections::BTreeMap;

use scalegrid_core::{Benefits, PerformanceTarget, ResourceType, ScalabilityPlan, ScalingAction};

/// Spacing between consecutive scaling actions on the timeline.
pub const SCALING_SPACING_SECS: u64 = 120;
/// Spacing between consecutive optimization targets on the timeline.
pub const OPTIMIZATION_SPACING_SECS: u64 = 180;
/// Performance gain credited to each optimization target.
pub const TARGET_PERFORMANCE_GAIN: f64 = 20.0;

const MONITORING_METRICS: [&str; 8] = [
    "cpu_utilization",
    "memory_utilization",
    "response_time",
    "throughput",
    "error_rate",
    "availability",
    "cost_per_hour",
    "resource_efficiency",
];

const BASE_ROLLBACK: [&str; 4] = [
    "Monitor all metrics continuously during implementation",
    "Maintain snapshots of current configuration",
    "Implement circuit breakers for automatic rollback",
    "Keep rollback procedures readily available",
];

/// Build a plan from analyzed actions and targets.
///
/// Both inputs are expected in priority order, as the analyzers return
/// them. The timeline starts at `created_at`.
pub fn assemble_plan(
    plan_id: String,
    created_at: u64,
    scaling_actions: Vec<ScalingAction>,
    performance_targets: Vec<PerformanceTarget>,
) -> ScalabilityPlan {
    ScalabilityPlan {
        resource_requirements: resource_requirements(&scaling_actions),
        timeline: timeline(created_at, &scaling_actions, &performance_targets),
        success_criteria: success_criteria(&scaling_actions, &performance_targets),
        monitoring_metrics: MONITORING_METRICS.iter().map(|m| m.to_string()).collect(),
        rollback_strategy: rollback_strategy(&scaling_actions),
        estimated_cost: scaling_actions.iter().map(|a| a.cost_estimate).sum(),
        expected_benefits: expected_benefits(&scaling_actions, &performance_targets),
        plan_id,
        created_at,
        scaling_actions,
        performance_targets,
    }
}

/// Net capacity delta per resource: growth adds, shrink subtracts.
pub fn resource_requirements(actions: &[ScalingAction]) -> BTreeMap<ResourceType, f64> {
    let mut requirements = BTreeMap::new();
    for action in actions {
        *requirements.entry(action.resource_type).or_insert(0.0) += action.signed_magnitude();
    }
    requirements
}

pub fn timeline(
    start: u64,
    actions: &[ScalingAction],
    targets: &[PerformanceTarget],
) -> BTreeMap<String, u64> {
    let mut timeline = BTreeMap::new();
    for (i, action) in actions.iter().enumerate() {
        timeline.insert(
            format!("scaling-action:{}", action.action_id),
            start + i as u64 * SCALING_SPACING_SECS,
        );
    }
    let optimization_start = start + actions.len() as u64 * SCALING_SPACING_SECS;
    for (i, target) in targets.iter().enumerate() {
        timeline.insert(
            format!("performance-target:{}", target.metric),
            optimization_start + i as u64 * OPTIMIZATION_SPACING_SECS,
        );
    }
    timeline
}

pub fn expected_benefits(actions: &[ScalingAction], targets: &[PerformanceTarget]) -> Benefits {
    let mut benefits = Benefits::default();
    for action in actions {
        benefits.add(&action.expected_impact);
    }
    benefits.performance_improvement += TARGET_PERFORMANCE_GAIN * targets.len() as f64;
    benefits
}

fn success_criteria(actions: &[ScalingAction], targets: &[PerformanceTarget]) -> Vec<String> {
    let mut criteria = Vec::new();
    if !actions.is_empty() {
        criteria.extend([
            "All critical scaling actions completed successfully",
            "Resource utilization within optimal ranges",
            "No service disruption during scaling operations",
        ]);
    }
    if !targets.is_empty() {
        criteria.extend([
            "Performance metrics meet or exceed targets",
            "Response time improvements achieved",
            "System throughput increased as planned",
        ]);
    }
    criteria.extend([
        "System stability maintained throughout process",
        "Cost targets met or exceeded",
        "Monitoring and alerting functioning correctly",
    ]);
    criteria.into_iter().map(str::to_string).collect()
}

fn rollback_strategy(actions: &[ScalingAction]) -> Vec<String> {
    BASE_ROLLBACK
        .iter()
        .map(|s| s.to_string())
        .chain(actions.iter().flat_map(|a| a.rollback_plan.iter().cloned()))
        .collect()
}
