//! Request and result types for the orchestration entry points.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use scalegrid_balancer::{BalancingAnalytics, BalancingRecord};
use scalegrid_core::{
    ActionOutcome, CapabilityRequirement, ExpansionPlan, LoadBalancingStrategy,
    OrchestrationStatus, PerformanceMetric, ResourceMetrics, ResourceType, ScalabilityPlan,
    ScalingDirection, WorkloadDistribution, WorkloadNode,
};
use scalegrid_expansion::{ExpansionAnalytics, ExpansionRecord};
use scalegrid_optimizer::{OptimizationReport, PerformanceAnalytics};
use scalegrid_scaler::ScalingAnalytics;

use crate::history::ScalabilityAnalytics;

/// Outcome of one scaling action within a plan execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingOutcome {
    pub action_id: String,
    pub resource_type: ResourceType,
    pub direction: ScalingDirection,
    pub outcome: ActionOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalabilityExecution {
    pub orchestration_id: String,
    pub plan_id: String,
    pub status: OrchestrationStatus,
    /// In plan order.
    pub scaling_results: Vec<ScalingOutcome>,
    /// Absent when the plan had no performance targets.
    pub optimization: Option<OptimizationReport>,
    pub started_at: u64,
    pub finished_at: u64,
}

impl ScalabilityExecution {
    pub fn successful_actions(&self) -> usize {
        let scaling = self
            .scaling_results
            .iter()
            .filter(|r| r.outcome.is_success())
            .count();
        scaling
            + self
                .optimization
                .as_ref()
                .map_or(0, |r| r.successful_optimizations)
    }

    pub fn total_actions(&self) -> usize {
        self.scaling_results.len() + self.optimization.as_ref().map_or(0, |r| r.records.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionOrchestration {
    pub orchestration_id: String,
    pub total_requirements: usize,
    pub plans: Vec<ExpansionPlan>,
    /// One per plan, in plan order.
    pub executions: Vec<ExpansionRecord>,
    pub successful_expansions: usize,
    pub status: OrchestrationStatus,
    pub started_at: u64,
    pub finished_at: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancingOrchestration {
    pub orchestration_id: String,
    pub total_nodes: usize,
    pub total_workload: f64,
    pub strategy: LoadBalancingStrategy,
    pub distribution: Option<WorkloadDistribution>,
    pub execution: Option<BalancingRecord>,
    /// Set when the distribution could not be computed.
    pub error: Option<String>,
    pub status: OrchestrationStatus,
    pub started_at: u64,
    pub finished_at: u64,
}

/// Inputs for one full cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfiniteScalingRequest {
    #[serde(default)]
    pub resource_metrics: BTreeMap<ResourceType, ResourceMetrics>,
    #[serde(default)]
    pub performance_metrics: BTreeMap<PerformanceMetric, f64>,
    #[serde(default)]
    pub capability_requirements: Vec<CapabilityRequirement>,
    #[serde(default)]
    pub nodes: Vec<WorkloadNode>,
    #[serde(default)]
    pub total_workload: f64,
    /// Falls back to the balancer's configured default.
    #[serde(default)]
    pub strategy: Option<LoadBalancingStrategy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfiniteScalingReport {
    pub orchestration_id: String,
    pub plan: ScalabilityPlan,
    pub scalability: ScalabilityExecution,
    /// Absent when the request carried no capability requirements.
    pub expansion: Option<ExpansionOrchestration>,
    pub load_balancing: BalancingOrchestration,
    pub status: OrchestrationStatus,
    pub started_at: u64,
    pub finished_at: u64,
}

/// Every analytics view in one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub scalability: ScalabilityAnalytics,
    pub scaling: ScalingAnalytics,
    pub performance: PerformanceAnalytics,
    pub expansion: ExpansionAnalytics,
    pub balancing: BalancingAnalytics,
}
