//! End-to-end orchestration cycles against scripted actuators.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use scalegrid_core::{
    ActionOutcome, BoxFuture, CapabilityRequirement, CapabilityType, ExecutionContext,
    LoadBalancingStrategy, NodeHealth, OrchestrationStatus, PerformanceMetric, ResourceMetrics,
    ResourceType, ScaleFn, ScalegridConfig, ScalingAction, StepFn, WorkloadNode, cancel_pair,
};
use scalegrid_expansion::ExpansionStatus;
use scalegrid_orchestrator::{InfiniteScalingRequest, ScalabilityOrchestrator};

fn ctx() -> ExecutionContext {
    ExecutionContext::new(4, Duration::from_secs(5))
}

fn metrics(readings: &[(ResourceType, f64)]) -> BTreeMap<ResourceType, ResourceMetrics> {
    readings
        .iter()
        .map(|&(rt, usage)| (rt, ResourceMetrics::new(rt, usage, 100.0)))
        .collect()
}

fn node(id: &str, capacity: f64, load: f64, health: NodeHealth) -> WorkloadNode {
    WorkloadNode {
        node_id: id.to_string(),
        capacity,
        current_load: load,
        response_time: 50.0,
        health_status: health,
        location: "eu-west".to_string(),
        capabilities: Vec::new(),
    }
}

fn full_request() -> InfiniteScalingRequest {
    InfiniteScalingRequest {
        resource_metrics: metrics(&[(ResourceType::Cpu, 85.0)]),
        performance_metrics: [(PerformanceMetric::ResponseTime, 250.0)]
            .into_iter()
            .collect(),
        capability_requirements: vec![CapabilityRequirement::new(
            CapabilityType::Processing,
            900.0,
            1000.0,
            5,
        )],
        nodes: vec![
            node("n1", 1000.0, 0.0, NodeHealth::Healthy),
            node("n2", 1000.0, 0.0, NodeHealth::Healthy),
            node("n3", 1000.0, 0.0, NodeHealth::Healthy),
        ],
        total_workload: 1200.0,
        strategy: Some(LoadBalancingStrategy::RoundRobin),
    }
}

#[tokio::test]
async fn full_cycle_with_stock_actuators_completes() {
    let orchestrator = ScalabilityOrchestrator::default();
    let report = orchestrator
        .orchestrate_infinite_scaling(&full_request(), &ctx())
        .await;

    assert_eq!(report.status, OrchestrationStatus::Completed);
    assert_eq!(report.scalability.status, OrchestrationStatus::Completed);
    assert_eq!(report.plan.scaling_actions.len(), 1);
    assert_eq!(report.plan.performance_targets.len(), 1);

    let expansion = report.expansion.expect("requirements were supplied");
    assert_eq!(expansion.status, OrchestrationStatus::Completed);
    assert_eq!(expansion.successful_expansions, 1);
    assert_eq!(expansion.executions[0].actual_capacity_increase, 1000.0);

    let distribution = report.load_balancing.distribution.expect("distribution");
    assert!(distribution.node_assignments.values().all(|&v| v == 400.0));

    let analytics = orchestrator.analytics().await;
    assert_eq!(analytics.scalability.total_plans, 1);
    assert_eq!(analytics.scalability.total_executions, 1);
    assert_eq!(analytics.scalability.success_rate, 1.0);
    assert_eq!(analytics.scaling.total_actions, 1);
    assert_eq!(analytics.expansion.completed, 1);
    assert_eq!(analytics.balancing.total_distributions, 1);
    assert!(analytics.performance.total_optimizations > 0);
    assert_eq!(analytics.performance.success_rate, 1.0);

    // One record per sub-cycle plus the outer cycle.
    assert_eq!(orchestrator.history().orchestrations().await.len(), 4);
}

#[tokio::test]
async fn one_failed_action_is_partial_success() {
    let scale_fn: ScaleFn = Arc::new(|action: ScalingAction| -> BoxFuture<anyhow::Result<()>> {
        Box::pin(async move {
            if action.resource_type == ResourceType::Memory {
                anyhow::bail!("memory pool exhausted");
            }
            Ok(())
        })
    });
    let orchestrator = ScalabilityOrchestrator::default().with_scale_fn(scale_fn);
    let plan = orchestrator
        .orchestrate_scalability(
            &metrics(&[(ResourceType::Cpu, 85.0), (ResourceType::Memory, 95.0)]),
            &BTreeMap::new(),
        )
        .await;
    let execution = orchestrator.execute_scalability_plan(&plan, &ctx()).await;

    assert_eq!(execution.status, OrchestrationStatus::PartialSuccess);
    assert_eq!(execution.scaling_results.len(), 2);
    let memory = execution
        .scaling_results
        .iter()
        .find(|r| r.resource_type == ResourceType::Memory)
        .expect("memory result");
    assert!(matches!(memory.outcome, ActionOutcome::Failed { .. }));

    let scaling = orchestrator.history().scaling().await;
    assert_eq!(scaling.len(), 1);
    assert_eq!(scaling[0].resource_type, ResourceType::Cpu);
}

#[tokio::test]
async fn timed_out_action_fails_the_execution() {
    let scale_fn: ScaleFn = Arc::new(|_action: ScalingAction| -> BoxFuture<anyhow::Result<()>> {
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
    });
    let orchestrator = ScalabilityOrchestrator::default().with_scale_fn(scale_fn);
    let plan = orchestrator
        .orchestrate_scalability(&metrics(&[(ResourceType::Cpu, 85.0)]), &BTreeMap::new())
        .await;
    let ctx = ExecutionContext::new(2, Duration::from_millis(20));
    let execution = orchestrator.execute_scalability_plan(&plan, &ctx).await;

    assert_eq!(execution.status, OrchestrationStatus::Failed);
    assert!(matches!(
        execution.scaling_results[0].outcome,
        ActionOutcome::TimedOut { .. }
    ));
}

#[tokio::test]
async fn cancelled_pass_is_partial_success() {
    let (handle, signal) = cancel_pair();
    handle.cancel();
    let ctx = ctx().with_cancel(signal);

    let orchestrator = ScalabilityOrchestrator::default();
    let plan = orchestrator
        .orchestrate_scalability(
            &metrics(&[(ResourceType::Cpu, 85.0), (ResourceType::Memory, 95.0)]),
            &BTreeMap::new(),
        )
        .await;
    let execution = orchestrator.execute_scalability_plan(&plan, &ctx).await;

    assert_eq!(execution.status, OrchestrationStatus::PartialSuccess);
    assert!(
        execution
            .scaling_results
            .iter()
            .all(|r| r.outcome == ActionOutcome::Cancelled)
    );
    assert!(orchestrator.history().scaling().await.is_empty());
}

#[tokio::test]
async fn failing_step_halts_expansion() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let step_fn: StepFn = Arc::new(
        move |_capability: CapabilityType, _step: String| -> BoxFuture<anyhow::Result<()>> {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if n == 1 {
                    anyhow::bail!("provisioning quota exceeded");
                }
                Ok(())
            })
        },
    );
    let orchestrator = ScalabilityOrchestrator::default().with_step_fn(step_fn);
    let result = orchestrator
        .orchestrate_capability_expansion(
            &[CapabilityRequirement::new(CapabilityType::Storage, 950.0, 1000.0, 3)],
            &ctx(),
        )
        .await;

    assert_eq!(result.status, OrchestrationStatus::Failed);
    let record = &result.executions[0];
    assert_eq!(record.status, ExpansionStatus::Halted);
    assert_eq!(record.completed_steps.len(), 1);
    assert!(record.failed_step.is_some());
    assert_eq!(record.actual_capacity_increase, 0.0);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let analytics = orchestrator.expansion_analytics().await;
    assert_eq!(analytics.halted, 1);
    assert_eq!(analytics.success_rate, 0.0);
}

#[tokio::test]
async fn requirements_below_threshold_complete_without_plans() {
    let orchestrator = ScalabilityOrchestrator::default();
    let result = orchestrator
        .orchestrate_capability_expansion(
            &[CapabilityRequirement::new(CapabilityType::Analytics, 100.0, 1000.0, 2)],
            &ctx(),
        )
        .await;

    assert_eq!(result.status, OrchestrationStatus::Completed);
    assert!(result.plans.is_empty());
    assert_eq!(result.total_requirements, 1);
}

#[tokio::test]
async fn unplaceable_workload_fails_balancing_but_not_the_cycle() {
    let orchestrator = ScalabilityOrchestrator::default();
    let request = InfiniteScalingRequest {
        nodes: vec![
            node("a", 100.0, 0.0, NodeHealth::Unhealthy),
            node("b", 100.0, 0.0, NodeHealth::Unhealthy),
        ],
        total_workload: 100.0,
        strategy: Some(LoadBalancingStrategy::Weighted),
        ..InfiniteScalingRequest::default()
    };
    let report = orchestrator.orchestrate_infinite_scaling(&request, &ctx()).await;

    assert!(report.expansion.is_none());
    assert_eq!(report.scalability.status, OrchestrationStatus::Completed);
    assert_eq!(report.load_balancing.status, OrchestrationStatus::Failed);
    assert!(report.load_balancing.error.is_some());
    assert!(report.load_balancing.distribution.is_none());
    assert_eq!(report.status, OrchestrationStatus::PartialSuccess);
    assert_eq!(orchestrator.balancing_analytics().await.total_distributions, 0);
}

#[tokio::test]
async fn leftover_workload_is_partial_success() {
    let orchestrator = ScalabilityOrchestrator::default();
    let nodes = vec![
        node("n1", 1000.0, 200.0, NodeHealth::Healthy),
        node("n2", 800.0, 600.0, NodeHealth::Healthy),
        node("n3", 1200.0, 100.0, NodeHealth::Healthy),
    ];
    let result = orchestrator
        .orchestrate_load_balancing(&nodes, 2500.0, Some(LoadBalancingStrategy::LeastConnections))
        .await;

    assert_eq!(result.status, OrchestrationStatus::PartialSuccess);
    let execution = result.execution.expect("execution");
    assert_eq!(execution.unassigned_workload, 400.0);
    assert_eq!(execution.total_nodes_balanced, 3);
}

#[tokio::test]
async fn config_thresholds_drive_planning() {
    let config = ScalegridConfig::from_toml_str(
        r#"
        [scaler.policies.cpu]
        scale_up_threshold = 90.0
        scale_down_threshold = 30.0
        scale_factor = 1.5

        [balancer]
        default_strategy = "round_robin"
        "#,
    )
    .unwrap();
    let orchestrator = ScalabilityOrchestrator::new(&config).unwrap();

    let plan = orchestrator
        .orchestrate_scalability(&metrics(&[(ResourceType::Cpu, 85.0)]), &BTreeMap::new())
        .await;
    assert!(plan.scaling_actions.is_empty());

    let result = orchestrator
        .orchestrate_load_balancing(&[node("solo", 100.0, 0.0, NodeHealth::Healthy)], 10.0, None)
        .await;
    assert_eq!(result.strategy, LoadBalancingStrategy::RoundRobin);
}
