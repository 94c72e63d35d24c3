//! ScalabilityOrchestrator: wires the components into orchestration cycles.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use scalegrid_balancer::{BalancingAnalytics, LoadBalancer, balancing_analytics};
use scalegrid_core::{
    ActionOutcome, CapabilityRequirement, ConfigError, ExecutionContext, LoadBalancingStrategy,
    OptimizeFn, OrchestrationResult, OrchestrationStatus, PerformanceMetric, ResourceMetrics,
    ResourceType, ScalabilityPlan, ScalegridConfig, ScaleFn, StepFn, WorkloadDistribution,
    WorkloadNode, epoch_secs,
};
use scalegrid_expansion::{
    CapabilityExpander, ExpansionAnalytics, ExpansionStatus, expansion_analytics,
};
use scalegrid_optimizer::{PerformanceAnalytics, PerformanceOptimizer, performance_analytics};
use scalegrid_scaler::{ResourceScaler, ScalingAnalytics, scaling_analytics};

use crate::history::{
    History, OrchestrationKind, OrchestrationRecord, ScalabilityAnalytics, scalability_analytics,
};
use crate::plan::assemble_plan;
use crate::report::{
    AnalyticsReport, BalancingOrchestration, ExpansionOrchestration, InfiniteScalingReport,
    InfiniteScalingRequest, ScalabilityExecution, ScalingOutcome,
};

/// Single authoritative orchestrator for one process.
///
/// Owns the plan store and every history log; the components it drives
/// hold nothing but their policies and id counters.
pub struct ScalabilityOrchestrator {
    scaler: ResourceScaler,
    optimizer: PerformanceOptimizer,
    expander: CapabilityExpander,
    balancer: LoadBalancer,
    execution: ExecutionContext,
    plans: RwLock<HashMap<String, ScalabilityPlan>>,
    history: History,
    sequence: AtomicU64,
}

impl Default for ScalabilityOrchestrator {
    fn default() -> Self {
        Self::from_parts(
            ResourceScaler::default(),
            PerformanceOptimizer::default(),
            CapabilityExpander::default(),
            LoadBalancer::default(),
            ExecutionContext::default(),
        )
    }
}

impl ScalabilityOrchestrator {
    pub fn new(config: &ScalegridConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_parts(
            ResourceScaler::new(&config.scaler)?,
            PerformanceOptimizer::new(&config.optimizer)?,
            CapabilityExpander::new(&config.expansion)?,
            LoadBalancer::new(&config.balancer),
            ExecutionContext::from_config(&config.executor),
        ))
    }

    pub fn from_parts(
        scaler: ResourceScaler,
        optimizer: PerformanceOptimizer,
        expander: CapabilityExpander,
        balancer: LoadBalancer,
        execution: ExecutionContext,
    ) -> Self {
        Self {
            scaler,
            optimizer,
            expander,
            balancer,
            execution,
            plans: RwLock::new(HashMap::new()),
            history: History::new(),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn with_scale_fn(mut self, f: ScaleFn) -> Self {
        self.scaler = self.scaler.with_scale_fn(f);
        self
    }

    pub fn with_optimize_fn(mut self, f: OptimizeFn) -> Self {
        self.optimizer = self.optimizer.with_optimize_fn(f);
        self
    }

    pub fn with_step_fn(mut self, f: StepFn) -> Self {
        self.expander = self.expander.with_step_fn(f);
        self
    }

    /// Context built from the executor config, with no cancellation wired.
    pub fn execution_context(&self) -> ExecutionContext {
        self.execution.clone()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Analyze readings into a plan and store it.
    pub async fn orchestrate_scalability(
        &self,
        resource_metrics: &BTreeMap<ResourceType, ResourceMetrics>,
        performance_metrics: &BTreeMap<PerformanceMetric, f64>,
    ) -> ScalabilityPlan {
        let plan_id = self.next_id("plan");
        debug!(plan = %plan_id, status = %OrchestrationStatus::Planning, "planning scalability cycle");

        let actions = self.scaler.analyze_resource_needs(resource_metrics);
        let targets = self.optimizer.analyze_performance(performance_metrics);
        let plan = assemble_plan(plan_id, epoch_secs(), actions, targets);

        info!(
            plan = %plan.plan_id,
            actions = plan.scaling_actions.len(),
            targets = plan.performance_targets.len(),
            estimated_cost = plan.estimated_cost,
            "scalability plan created"
        );
        self.plans
            .write()
            .await
            .insert(plan.plan_id.clone(), plan.clone());
        plan
    }

    pub async fn plan(&self, plan_id: &str) -> Option<ScalabilityPlan> {
        self.plans.read().await.get(plan_id).cloned()
    }

    /// Run a plan: scaling actions on the bounded pool, then the optimizer
    /// when the plan carries targets.
    pub async fn execute_scalability_plan(
        &self,
        plan: &ScalabilityPlan,
        ctx: &ExecutionContext,
    ) -> ScalabilityExecution {
        let orchestration_id = self.next_id(OrchestrationKind::Scalability.as_str());
        let started_at = epoch_secs();
        info!(
            plan = %plan.plan_id,
            status = %OrchestrationStatus::Executing,
            actions = plan.scaling_actions.len(),
            targets = plan.performance_targets.len(),
            "executing scalability plan"
        );

        let results = self
            .scaler
            .execute_scaling_actions(&plan.scaling_actions, ctx)
            .await;
        let mut applied = Vec::new();
        let mut scaling_results = Vec::with_capacity(results.len());
        for (action, result) in plan.scaling_actions.iter().zip(results) {
            scaling_results.push(ScalingOutcome {
                action_id: action.action_id.clone(),
                resource_type: action.resource_type,
                direction: action.direction,
                outcome: ActionOutcome::from_result(&result),
            });
            if let Ok(record) = result {
                applied.push(record);
            }
        }

        let optimization = if plan.performance_targets.is_empty() {
            None
        } else {
            Some(
                self.optimizer
                    .optimize_performance(&plan.performance_targets, ctx)
                    .await,
            )
        };

        let mut execution = ScalabilityExecution {
            orchestration_id,
            plan_id: plan.plan_id.clone(),
            status: OrchestrationStatus::Executing,
            scaling_results,
            optimization,
            started_at,
            finished_at: 0,
        };
        let cancelled = execution
            .scaling_results
            .iter()
            .any(|r| r.outcome.is_cancelled())
            || execution.optimization.as_ref().is_some_and(|r| r.cancelled);
        execution.status = OrchestrationStatus::from_counts(
            execution.total_actions(),
            execution.successful_actions(),
            cancelled,
        );
        execution.finished_at = epoch_secs();

        self.history.extend_scaling(applied).await;
        if let Some(report) = &execution.optimization {
            self.history
                .extend_optimization(report.records.iter().cloned())
                .await;
        }
        self.history
            .record_orchestration(OrchestrationRecord {
                orchestration_id: execution.orchestration_id.clone(),
                kind: OrchestrationKind::Scalability,
                plan_id: Some(plan.plan_id.clone()),
                status: execution.status,
                started_at,
                finished_at: execution.finished_at,
            })
            .await;

        log_finished(
            &execution.orchestration_id,
            execution.status,
            "scalability plan executed",
        );
        execution
    }

    /// Plan and run an expansion for every requirement that needs one.
    ///
    /// Plans run one after another in priority order.
    pub async fn orchestrate_capability_expansion(
        &self,
        requirements: &[CapabilityRequirement],
        ctx: &ExecutionContext,
    ) -> ExpansionOrchestration {
        let orchestration_id = self.next_id(OrchestrationKind::CapabilityExpansion.as_str());
        let started_at = epoch_secs();

        let plans = self.expander.analyze_capability_needs(requirements);
        info!(
            orchestration = %orchestration_id,
            requirements = requirements.len(),
            plans = plans.len(),
            "capability expansion planned"
        );

        let mut executions = Vec::with_capacity(plans.len());
        for plan in &plans {
            let record = self.expander.execute_expansion_plan(plan, ctx).await;
            self.history.record_expansion(record.clone()).await;
            executions.push(record);
        }

        let successful_expansions = executions.iter().filter(|r| r.is_completed()).count();
        let cancelled = executions
            .iter()
            .any(|r| r.status == ExpansionStatus::Cancelled);
        let status =
            OrchestrationStatus::from_counts(plans.len(), successful_expansions, cancelled);
        let finished_at = epoch_secs();

        self.history
            .record_orchestration(OrchestrationRecord {
                orchestration_id: orchestration_id.clone(),
                kind: OrchestrationKind::CapabilityExpansion,
                plan_id: None,
                status,
                started_at,
                finished_at,
            })
            .await;
        log_finished(&orchestration_id, status, "capability expansion finished");

        ExpansionOrchestration {
            orchestration_id,
            total_requirements: requirements.len(),
            plans,
            executions,
            successful_expansions,
            status,
            started_at,
            finished_at,
        }
    }

    /// Distribute and apply `total_workload`. `None` uses the configured
    /// default strategy.
    pub async fn orchestrate_load_balancing(
        &self,
        nodes: &[WorkloadNode],
        total_workload: f64,
        strategy: Option<LoadBalancingStrategy>,
    ) -> BalancingOrchestration {
        let orchestration_id = self.next_id(OrchestrationKind::LoadBalancing.as_str());
        let started_at = epoch_secs();
        let strategy = strategy.unwrap_or_else(|| self.balancer.default_strategy());

        let (distribution, execution, error, status) = match self
            .balancer
            .analyze_workload_distribution(nodes, total_workload, strategy)
        {
            Ok(distribution) => {
                let record = self.balancer.execute_load_balancing(&distribution, nodes);
                self.history.record_distribution(record.clone()).await;
                let status = record.status;
                (Some(distribution), Some(record), None, status)
            }
            Err(err) => {
                error!(
                    orchestration = %orchestration_id,
                    strategy = %strategy,
                    error = %err,
                    "load balancing failed"
                );
                (None, None, Some(err.to_string()), OrchestrationStatus::Failed)
            }
        };
        let finished_at = epoch_secs();

        self.history
            .record_orchestration(OrchestrationRecord {
                orchestration_id: orchestration_id.clone(),
                kind: OrchestrationKind::LoadBalancing,
                plan_id: None,
                status,
                started_at,
                finished_at,
            })
            .await;
        if status != OrchestrationStatus::Failed {
            log_finished(&orchestration_id, status, "load balancing finished");
        }

        BalancingOrchestration {
            orchestration_id,
            total_nodes: nodes.len(),
            total_workload,
            strategy,
            distribution,
            execution,
            error,
            status,
            started_at,
            finished_at,
        }
    }

    /// Compute a distribution without applying or recording it.
    pub fn preview_distribution(
        &self,
        nodes: &[WorkloadNode],
        total_workload: f64,
        strategy: Option<LoadBalancingStrategy>,
    ) -> OrchestrationResult<WorkloadDistribution> {
        let strategy = strategy.unwrap_or_else(|| self.balancer.default_strategy());
        self.balancer
            .analyze_workload_distribution(nodes, total_workload, strategy)
    }

    /// One full cycle: scalability, then expansion when requirements were
    /// supplied, then load balancing.
    pub async fn orchestrate_infinite_scaling(
        &self,
        request: &InfiniteScalingRequest,
        ctx: &ExecutionContext,
    ) -> InfiniteScalingReport {
        let orchestration_id = self.next_id(OrchestrationKind::InfiniteScaling.as_str());
        let started_at = epoch_secs();
        info!(orchestration = %orchestration_id, "infinite scaling cycle started");

        let plan = self
            .orchestrate_scalability(&request.resource_metrics, &request.performance_metrics)
            .await;
        let scalability = self.execute_scalability_plan(&plan, ctx).await;

        let expansion = if request.capability_requirements.is_empty() {
            None
        } else {
            Some(
                self.orchestrate_capability_expansion(&request.capability_requirements, ctx)
                    .await,
            )
        };

        let load_balancing = self
            .orchestrate_load_balancing(&request.nodes, request.total_workload, request.strategy)
            .await;

        let parts = [
            Some(scalability.status),
            expansion.as_ref().map(|e| e.status),
            Some(load_balancing.status),
        ];
        let status = OrchestrationStatus::combine(parts.into_iter().flatten());
        let finished_at = epoch_secs();

        self.history
            .record_orchestration(OrchestrationRecord {
                orchestration_id: orchestration_id.clone(),
                kind: OrchestrationKind::InfiniteScaling,
                plan_id: Some(plan.plan_id.clone()),
                status,
                started_at,
                finished_at,
            })
            .await;
        log_finished(&orchestration_id, status, "infinite scaling cycle finished");

        InfiniteScalingReport {
            orchestration_id,
            plan,
            scalability,
            expansion,
            load_balancing,
            status,
            started_at,
            finished_at,
        }
    }

    pub async fn scalability_analytics(&self) -> ScalabilityAnalytics {
        let plans = self.plans.read().await;
        let history = self.history.orchestrations().await;
        scalability_analytics(plans.values(), &history)
    }

    pub async fn scaling_analytics(&self) -> ScalingAnalytics {
        scaling_analytics(&self.history.scaling().await)
    }

    pub async fn performance_analytics(&self) -> PerformanceAnalytics {
        performance_analytics(&self.history.optimization().await)
    }

    pub async fn expansion_analytics(&self) -> ExpansionAnalytics {
        expansion_analytics(&self.history.expansion().await)
    }

    pub async fn balancing_analytics(&self) -> BalancingAnalytics {
        balancing_analytics(&self.history.distribution().await)
    }

    pub async fn analytics(&self) -> AnalyticsReport {
        AnalyticsReport {
            scalability: self.scalability_analytics().await,
            scaling: self.scaling_analytics().await,
            performance: self.performance_analytics().await,
            expansion: self.expansion_analytics().await,
            balancing: self.balancing_analytics().await,
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{}-{seq}", epoch_secs())
    }
}

fn log_finished(orchestration_id: &str, status: OrchestrationStatus, message: &str) {
    match status {
        OrchestrationStatus::Completed => {
            info!(orchestration = %orchestration_id, status = %status, "{message}")
        }
        OrchestrationStatus::Failed => {
            error!(orchestration = %orchestration_id, status = %status, "{message}")
        }
        _ => warn!(orchestration = %orchestration_id, status = %status, "{message}"),
    }
}
