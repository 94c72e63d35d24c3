//! Per-strategy assignment rules.
//!
//! Every function here takes nodes that already passed validation and
//! returns an assignment for each of them (zero where a node gets nothing).

use std::collections::BTreeMap;

use scalegrid_core::{LoadBalancingStrategy, NodeId, WorkloadNode};

/// Floor applied to the speed and free-share factors of the weighted rule.
const MIN_FACTOR: f64 = 0.1;
/// Floor applied to response times before inverting them (ms).
const MIN_RESPONSE_TIME: f64 = 0.1;

/// Node assignments plus whatever could not be placed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Allocation {
    pub assignments: BTreeMap<NodeId, f64>,
    pub unassigned: f64,
}

/// Strategy whose rule is actually applied.
pub fn effective_strategy(strategy: LoadBalancingStrategy) -> LoadBalancingStrategy {
    match strategy {
        LoadBalancingStrategy::ResourceBased | LoadBalancingStrategy::Geographic => {
            LoadBalancingStrategy::Weighted
        }
        other => other,
    }
}

pub fn allocate(
    nodes: &[WorkloadNode],
    total_workload: f64,
    strategy: LoadBalancingStrategy,
) -> Allocation {
    match effective_strategy(strategy) {
        LoadBalancingStrategy::RoundRobin => round_robin(nodes, total_workload),
        LoadBalancingStrategy::LeastConnections => least_connections(nodes, total_workload),
        LoadBalancingStrategy::ResponseTime => {
            proportional(nodes, total_workload, response_time_weight)
        }
        _ => proportional(nodes, total_workload, capacity_weight),
    }
}

fn round_robin(nodes: &[WorkloadNode], total_workload: f64) -> Allocation {
    let share = if nodes.is_empty() {
        0.0
    } else {
        total_workload / nodes.len() as f64
    };
    Allocation {
        assignments: nodes.iter().map(|n| (n.node_id.clone(), share)).collect(),
        unassigned: 0.0,
    }
}

/// Least-loaded first; each node takes at most its free headroom.
fn least_connections(nodes: &[WorkloadNode], total_workload: f64) -> Allocation {
    let mut order: Vec<&WorkloadNode> = nodes.iter().collect();
    // Stable: equal loads keep roster order.
    order.sort_by(|a, b| a.current_load.total_cmp(&b.current_load));

    let mut remaining = total_workload;
    let mut assignments = BTreeMap::new();
    for node in order {
        let assigned = remaining.min(node.headroom()).max(0.0);
        assignments.insert(node.node_id.clone(), assigned);
        remaining -= assigned;
    }
    Allocation {
        assignments,
        unassigned: remaining.max(0.0),
    }
}

/// Share of the total proportional to `weight`; unhealthy nodes get 0.
fn proportional(
    nodes: &[WorkloadNode],
    total_workload: f64,
    weight: fn(&WorkloadNode) -> f64,
) -> Allocation {
    let weights: Vec<f64> = nodes
        .iter()
        .map(|n| if n.is_healthy() { weight(n) } else { 0.0 })
        .collect();
    let total_weight: f64 = weights.iter().sum();

    let assignments = nodes
        .iter()
        .zip(&weights)
        .map(|(node, w)| {
            let share = if total_weight > 0.0 {
                w / total_weight * total_workload
            } else {
                0.0
            };
            (node.node_id.clone(), share)
        })
        .collect();
    Allocation {
        assignments,
        unassigned: 0.0,
    }
}

/// `(capacity / 100) * max(0.1, 1 - rt/1000) * max(0.1, 1 - load/capacity)`
pub fn capacity_weight(node: &WorkloadNode) -> f64 {
    let capacity_factor = node.capacity / 100.0;
    let speed_factor = (1.0 - node.response_time / 1000.0).max(MIN_FACTOR);
    let free_factor = (1.0 - node.current_load / node.capacity).max(MIN_FACTOR);
    capacity_factor * speed_factor * free_factor
}

pub fn response_time_weight(node: &WorkloadNode) -> f64 {
    1.0 / node.response_time.max(MIN_RESPONSE_TIME)
}
