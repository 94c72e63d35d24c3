//! Append-only history logs.
//!
//! Every log sits behind its own `RwLock` so an analytics read never waits
//! on an unrelated writer. Entries are only ever appended.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use scalegrid_balancer::BalancingRecord;
use scalegrid_core::{Benefits, OrchestrationStatus, ScalabilityPlan};
use scalegrid_expansion::ExpansionRecord;
use scalegrid_optimizer::OptimizationRecord;
use scalegrid_scaler::ScalingRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationKind {
    Scalability,
    CapabilityExpansion,
    LoadBalancing,
    InfiniteScaling,
}

impl OrchestrationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scalability => "scalability",
            Self::CapabilityExpansion => "capability-expansion",
            Self::LoadBalancing => "load-balancing",
            Self::InfiniteScaling => "infinite-scaling",
        }
    }
}

impl fmt::Display for OrchestrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finished orchestration cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationRecord {
    pub orchestration_id: String,
    pub kind: OrchestrationKind,
    /// Set for scalability executions.
    pub plan_id: Option<String>,
    pub status: OrchestrationStatus,
    pub started_at: u64,
    pub finished_at: u64,
}

#[derive(Debug, Default)]
pub struct History {
    orchestrations: RwLock<Vec<OrchestrationRecord>>,
    scaling: RwLock<Vec<ScalingRecord>>,
    optimization: RwLock<Vec<OptimizationRecord>>,
    expansion: RwLock<Vec<ExpansionRecord>>,
    distribution: RwLock<Vec<BalancingRecord>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_orchestration(&self, record: OrchestrationRecord) {
        self.orchestrations.write().await.push(record);
    }

    pub async fn extend_scaling(&self, records: impl IntoIterator<Item = ScalingRecord>) {
        self.scaling.write().await.extend(records);
    }

    pub async fn extend_optimization(
        &self,
        records: impl IntoIterator<Item = OptimizationRecord>,
    ) {
        self.optimization.write().await.extend(records);
    }

    pub async fn record_expansion(&self, record: ExpansionRecord) {
        self.expansion.write().await.push(record);
    }

    pub async fn record_distribution(&self, record: BalancingRecord) {
        self.distribution.write().await.push(record);
    }

    pub async fn orchestrations(&self) -> Vec<OrchestrationRecord> {
        self.orchestrations.read().await.clone()
    }

    pub async fn scaling(&self) -> Vec<ScalingRecord> {
        self.scaling.read().await.clone()
    }

    pub async fn optimization(&self) -> Vec<OptimizationRecord> {
        self.optimization.read().await.clone()
    }

    pub async fn expansion(&self) -> Vec<ExpansionRecord> {
        self.expansion.read().await.clone()
    }

    pub async fn distribution(&self) -> Vec<BalancingRecord> {
        self.distribution.read().await.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalabilityAnalytics {
    pub total_plans: usize,
    pub total_executions: usize,
    /// Share of scalability executions that ended `Completed`.
    pub success_rate: f64,
    pub average_cost: f64,
    pub average_benefits: Benefits,
}

/// Summarize stored plans and the scalability executions among `history`.
pub fn scalability_analytics<'a>(
    plans: impl IntoIterator<Item = &'a ScalabilityPlan>,
    history: &[OrchestrationRecord],
) -> ScalabilityAnalytics {
    let mut analytics = ScalabilityAnalytics::default();
    let mut total_cost = 0.0;
    let mut total_benefits = Benefits::default();
    for plan in plans {
        analytics.total_plans += 1;
        total_cost += plan.estimated_cost;
        total_benefits.add(&plan.expected_benefits);
    }
    if analytics.total_plans > 0 {
        let n = analytics.total_plans as f64;
        analytics.average_cost = total_cost / n;
        analytics.average_benefits = total_benefits.scaled(1.0 / n);
    }

    let executions: Vec<&OrchestrationRecord> = history
        .iter()
        .filter(|r| r.kind == OrchestrationKind::Scalability)
        .collect();
    analytics.total_executions = executions.len();
    if !executions.is_empty() {
        let completed = executions
            .iter()
            .filter(|r| r.status == OrchestrationStatus::Completed)
            .count();
        analytics.success_rate = completed as f64 / executions.len() as f64;
    }
    analytics
}
