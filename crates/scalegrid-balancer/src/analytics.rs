//! Balancing records and their summary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use scalegrid_core::{LoadBalancingStrategy, NodeId, OrchestrationStatus};

/// Load change applied to one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeBalance {
    pub node_id: NodeId,
    pub assigned_load: f64,
    pub previous_load: f64,
    pub new_total_load: f64,
    /// New total load as a percentage of capacity.
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancingRecord {
    pub distribution_id: String,
    pub strategy: LoadBalancingStrategy,
    pub node_results: Vec<NodeBalance>,
    pub total_nodes_balanced: usize,
    pub unassigned_workload: f64,
    pub status: OrchestrationStatus,
    pub recorded_at: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalancingAnalytics {
    pub total_distributions: usize,
    /// Share of distributions that placed all of their workload.
    pub success_rate: f64,
    pub average_nodes_per_distribution: f64,
    pub most_used_strategy: Option<LoadBalancingStrategy>,
    pub total_unassigned_workload: f64,
}

pub fn balancing_analytics(history: &[BalancingRecord]) -> BalancingAnalytics {
    if history.is_empty() {
        return BalancingAnalytics::default();
    }

    let total = history.len() as f64;
    let completed = history
        .iter()
        .filter(|r| r.status == OrchestrationStatus::Completed)
        .count();
    let nodes: usize = history.iter().map(|r| r.total_nodes_balanced).sum();

    let mut counts: BTreeMap<LoadBalancingStrategy, usize> = BTreeMap::new();
    for record in history {
        *counts.entry(record.strategy).or_insert(0) += 1;
    }
    let most_used_strategy = counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(strategy, _)| *strategy);

    BalancingAnalytics {
        total_distributions: history.len(),
        success_rate: completed as f64 / total,
        average_nodes_per_distribution: nodes as f64 / total,
        most_used_strategy,
        total_unassigned_workload: history.iter().map(|r| r.unassigned_workload).sum(),
    }
}
