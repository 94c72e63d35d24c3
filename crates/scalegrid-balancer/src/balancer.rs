//! Load balancer: builds and applies workload distributions.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use scalegrid_core::*;

use crate::analytics::{BalancingRecord, NodeBalance};
use crate::strategy::{allocate, effective_strategy};

/// Rules attached to every distribution.
const BASE_RULES: [&str; 4] = [
    "Route traffic only to healthy nodes",
    "Monitor node health continuously",
    "Implement circuit breaker for failed nodes",
    "Maintain session affinity when required",
];

const MONITORING_METRICS: [&str; 8] = [
    "requests_per_second",
    "response_time_p95",
    "error_rate",
    "node_utilization",
    "connection_count",
    "throughput",
    "load_distribution_variance",
    "failover_count",
];

/// Relative slack below which leftover workload is treated as rounding.
const UNASSIGNED_EPSILON: f64 = 1e-9;

pub struct LoadBalancer {
    default_strategy: LoadBalancingStrategy,
    sequence: AtomicU64,
}

impl Default for LoadBalancer {
    fn default() -> Self {
        Self::new(&BalancerConfig::default())
    }
}

impl LoadBalancer {
    pub fn new(config: &BalancerConfig) -> Self {
        Self {
            default_strategy: config.default_strategy,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn default_strategy(&self) -> LoadBalancingStrategy {
        self.default_strategy
    }

    /// Distribute `total_workload` across `nodes` under `strategy`.
    ///
    /// Malformed and duplicate nodes are skipped and get no assignment key.
    /// A positive workload that lands on no node at all is an error.
    pub fn analyze_workload_distribution(
        &self,
        nodes: &[WorkloadNode],
        total_workload: f64,
        strategy: LoadBalancingStrategy,
    ) -> OrchestrationResult<WorkloadDistribution> {
        if !total_workload.is_finite() || total_workload < 0.0 {
            return Err(OrchestrationError::Validation(format!(
                "total workload must be a non-negative number, got {total_workload}"
            )));
        }

        let usable = usable_nodes(nodes);
        if usable.is_empty() && total_workload > 0.0 {
            return Err(OrchestrationError::Validation(format!(
                "no usable nodes for {total_workload} units of workload ({} supplied)",
                nodes.len()
            )));
        }

        let allocation = allocate(&usable, total_workload, strategy);
        let assigned: f64 = allocation.assignments.values().sum();
        if total_workload > 0.0 && allocation.assignments.values().all(|&v| v == 0.0) {
            warn!(
                strategy = %strategy,
                total_workload,
                nodes = usable.len(),
                "no node qualified for any workload"
            );
            return Err(OrchestrationError::DegenerateDistribution {
                total_workload,
                nodes: usable.len(),
            });
        }

        let mut unassigned = allocation.unassigned;
        if unassigned <= total_workload * UNASSIGNED_EPSILON {
            unassigned = 0.0;
        }
        let expected_performance =
            predict_performance(&usable, nodes.len(), &allocation.assignments, assigned);

        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let distribution = WorkloadDistribution {
            distribution_id: format!("distribution-{}-{seq}", epoch_secs()),
            strategy,
            total_workload,
            node_assignments: allocation.assignments,
            unassigned_workload: unassigned,
            expected_performance,
            load_balancing_rules: balancing_rules(strategy),
            monitoring_metrics: MONITORING_METRICS.iter().map(|m| m.to_string()).collect(),
        };
        debug!(
            distribution = %distribution.distribution_id,
            strategy = %strategy,
            total_workload,
            assigned,
            unassigned,
            "workload distribution computed"
        );
        Ok(distribution)
    }

    /// Apply a distribution to the roster it was computed from.
    ///
    /// Purely additive: each node's new load is its previous load plus its
    /// assignment. Nodes absent from the distribution are left out.
    pub fn execute_load_balancing(
        &self,
        distribution: &WorkloadDistribution,
        nodes: &[WorkloadNode],
    ) -> BalancingRecord {
        let mut seen = BTreeSet::new();
        let node_results: Vec<NodeBalance> = nodes
            .iter()
            .filter(|node| seen.insert(node.node_id.as_str()))
            .filter_map(|node| {
                let assigned = *distribution.node_assignments.get(&node.node_id)?;
                let new_total = node.current_load + assigned;
                let utilization = if node.capacity > 0.0 {
                    new_total / node.capacity * 100.0
                } else {
                    0.0
                };
                Some(NodeBalance {
                    node_id: node.node_id.clone(),
                    assigned_load: assigned,
                    previous_load: node.current_load,
                    new_total_load: new_total,
                    utilization,
                })
            })
            .collect();

        let status = if distribution.unassigned_workload > 0.0 {
            OrchestrationStatus::PartialSuccess
        } else {
            OrchestrationStatus::Completed
        };
        info!(
            distribution = %distribution.distribution_id,
            nodes = node_results.len(),
            unassigned = distribution.unassigned_workload,
            status = %status,
            "load balancing applied"
        );

        BalancingRecord {
            distribution_id: distribution.distribution_id.clone(),
            strategy: distribution.strategy,
            total_nodes_balanced: node_results.len(),
            node_results,
            unassigned_workload: distribution.unassigned_workload,
            status,
            recorded_at: epoch_secs(),
        }
    }
}

fn usable_nodes(nodes: &[WorkloadNode]) -> Vec<WorkloadNode> {
    let mut seen = BTreeSet::new();
    let mut usable = Vec::with_capacity(nodes.len());
    for node in nodes {
        if !node.is_well_formed() {
            warn!(node = %node.node_id, capacity = node.capacity, "skipping malformed node");
            continue;
        }
        if !seen.insert(node.node_id.clone()) {
            warn!(node = %node.node_id, "skipping duplicate node id");
            continue;
        }
        usable.push(node.clone());
    }
    usable
}

/// Efficiency is the share of the supplied roster (malformed and duplicate
/// entries included) that is healthy and carries load.
fn predict_performance(
    nodes: &[WorkloadNode],
    supplied: usize,
    assignments: &std::collections::BTreeMap<NodeId, f64>,
    assigned: f64,
) -> ExpectedPerformance {
    let total_capacity: f64 = nodes.iter().map(|n| n.capacity).sum();
    let mut response_time = 0.0;
    let mut utilization = 0.0;
    let mut healthy_loaded = 0usize;

    for node in nodes {
        let Some(&load) = assignments.get(&node.node_id) else {
            continue;
        };
        if load <= 0.0 {
            continue;
        }
        let weight = if assigned > 0.0 { load / assigned } else { 0.0 };
        response_time += node.response_time * weight;
        utilization += (node.current_load + load) / node.capacity * 100.0 * weight;
        if node.is_healthy() {
            healthy_loaded += 1;
        }
    }

    ExpectedPerformance {
        expected_response_time: response_time,
        expected_utilization: utilization,
        load_distribution_efficiency: if supplied == 0 {
            0.0
        } else {
            healthy_loaded as f64 / supplied as f64 * 100.0
        },
        capacity_utilization: if total_capacity > 0.0 {
            assigned / total_capacity * 100.0
        } else {
            0.0
        },
    }
}

fn balancing_rules(strategy: LoadBalancingStrategy) -> Vec<String> {
    let specific: &[&str] = match effective_strategy(strategy) {
        LoadBalancingStrategy::RoundRobin => &[
            "Distribute requests evenly across all nodes",
            "Reset round-robin counter periodically",
        ],
        LoadBalancingStrategy::LeastConnections => &[
            "Route to node with fewest active connections",
            "Update connection counts in real-time",
        ],
        LoadBalancingStrategy::ResponseTime => &[
            "Route to node with best response time",
            "Update response time metrics every minute",
        ],
        _ => &[
            "Assign traffic based on node capacity and performance",
            "Recalculate weights every 5 minutes",
        ],
    };
    BASE_RULES
        .iter()
        .chain(specific)
        .map(|r| r.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, capacity: f64, load: f64, rt: f64, health: NodeHealth) -> WorkloadNode {
        WorkloadNode {
            node_id: id.to_string(),
            capacity,
            current_load: load,
            response_time: rt,
            health_status: health,
            location: "eu-west".to_string(),
            capabilities: Vec::new(),
        }
    }

    fn cluster() -> Vec<WorkloadNode> {
        vec![
            node("n1", 1000.0, 200.0, 50.0, NodeHealth::Healthy),
            node("n2", 800.0, 600.0, 120.0, NodeHealth::Healthy),
            node("n3", 1200.0, 100.0, 30.0, NodeHealth::Healthy),
        ]
    }

    #[test]
    fn weighted_conserves_workload() {
        let lb = LoadBalancer::default();
        let dist = lb
            .analyze_workload_distribution(&cluster(), 1000.0, LoadBalancingStrategy::Weighted)
            .unwrap();

        let sum = dist.assigned_total() + dist.unassigned_workload;
        assert!((sum - 1000.0).abs() <= 1000.0 * 1e-6);
        assert_eq!(dist.unassigned_workload, 0.0);
        assert_eq!(dist.node_assignments.len(), 3);
        // The least-loaded, fastest node gets the largest share.
        assert!(dist.node_assignments["n3"] > dist.node_assignments["n1"]);
        assert!(dist.node_assignments["n1"] > dist.node_assignments["n2"]);
    }

    #[test]
    fn weighted_gives_unhealthy_nodes_nothing() {
        let lb = LoadBalancer::default();
        let mut nodes = cluster();
        nodes[0].health_status = NodeHealth::Unhealthy;
        let dist = lb
            .analyze_workload_distribution(&nodes, 500.0, LoadBalancingStrategy::Weighted)
            .unwrap();
        assert_eq!(dist.node_assignments["n1"], 0.0);
        assert!((dist.assigned_total() - 500.0).abs() < 1e-6);
    }

    #[test]
    fn round_robin_splits_evenly() {
        let lb = LoadBalancer::default();
        let dist = lb
            .analyze_workload_distribution(&cluster(), 1200.0, LoadBalancingStrategy::RoundRobin)
            .unwrap();
        assert!(dist.node_assignments.values().all(|&v| v == 400.0));
        assert_eq!(dist.load_balancing_rules.len(), 6);
        assert_eq!(dist.monitoring_metrics.len(), 8);
    }

    #[test]
    fn least_connections_leftover_is_unassigned() {
        let lb = LoadBalancer::default();
        let dist = lb
            .analyze_workload_distribution(&cluster(), 2500.0, LoadBalancingStrategy::LeastConnections)
            .unwrap();
        assert_eq!(dist.unassigned_workload, 400.0);
        assert!((dist.assigned_total() + dist.unassigned_workload - 2500.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_workload_and_empty_roster() {
        let lb = LoadBalancer::default();
        assert!(matches!(
            lb.analyze_workload_distribution(&cluster(), -1.0, LoadBalancingStrategy::Weighted),
            Err(OrchestrationError::Validation(_))
        ));
        assert!(matches!(
            lb.analyze_workload_distribution(&cluster(), f64::NAN, LoadBalancingStrategy::Weighted),
            Err(OrchestrationError::Validation(_))
        ));
        assert!(matches!(
            lb.analyze_workload_distribution(&[], 10.0, LoadBalancingStrategy::Weighted),
            Err(OrchestrationError::Validation(_))
        ));
    }

    #[test]
    fn zero_workload_on_empty_roster_is_fine() {
        let lb = LoadBalancer::default();
        let dist = lb
            .analyze_workload_distribution(&[], 0.0, LoadBalancingStrategy::Weighted)
            .unwrap();
        assert!(dist.node_assignments.is_empty());
        assert_eq!(dist.unassigned_workload, 0.0);
    }

    #[test]
    fn all_unhealthy_is_degenerate() {
        let lb = LoadBalancer::default();
        let nodes: Vec<_> = cluster()
            .into_iter()
            .map(|mut n| {
                n.health_status = NodeHealth::Unhealthy;
                n
            })
            .collect();
        let err = lb
            .analyze_workload_distribution(&nodes, 100.0, LoadBalancingStrategy::Weighted)
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::DegenerateDistribution { nodes: 3, .. }
        ));
    }

    #[test]
    fn malformed_and_duplicate_nodes_get_no_key() {
        let lb = LoadBalancer::default();
        let mut nodes = cluster();
        nodes.push(node("bad", 0.0, 0.0, 10.0, NodeHealth::Healthy));
        nodes.push(node("n1", 5000.0, 0.0, 1.0, NodeHealth::Healthy));

        let dist = lb
            .analyze_workload_distribution(&nodes, 300.0, LoadBalancingStrategy::RoundRobin)
            .unwrap();
        assert_eq!(dist.node_assignments.len(), 3);
        assert!(!dist.node_assignments.contains_key("bad"));
        assert_eq!(dist.node_assignments["n1"], 100.0);
    }

    #[test]
    fn dropped_nodes_count_against_efficiency() {
        let lb = LoadBalancer::default();
        let clean = lb
            .analyze_workload_distribution(&cluster(), 300.0, LoadBalancingStrategy::Weighted)
            .unwrap();
        assert_eq!(clean.expected_performance.load_distribution_efficiency, 100.0);

        let mut nodes = cluster();
        nodes.push(node("bad", 0.0, 0.0, 10.0, NodeHealth::Healthy));
        let dist = lb
            .analyze_workload_distribution(&nodes, 300.0, LoadBalancingStrategy::Weighted)
            .unwrap();
        assert_eq!(dist.expected_performance.load_distribution_efficiency, 75.0);
    }

    #[test]
    fn invariants_hold_across_workloads() {
        let lb = LoadBalancer::default();
        let mut nodes = cluster();
        nodes.push(node("n4", 900.0, 0.0, 40.0, NodeHealth::Unhealthy));
        // n3 alone has 1100 free; total headroom is 800 + 200 + 1100 + 900.
        let total_headroom: f64 = nodes.iter().map(|n| n.headroom()).sum();
        assert_eq!(total_headroom, 3000.0);

        for workload in [0.0, 250.0, 1100.0, total_headroom, total_headroom + 700.0] {
            let weighted = lb
                .analyze_workload_distribution(&nodes, workload, LoadBalancingStrategy::Weighted)
                .unwrap();
            let sum = weighted.assigned_total();
            assert!(
                (sum - workload).abs() <= workload * 1e-6,
                "weighted sum {sum} != {workload}"
            );
            assert_eq!(weighted.unassigned_workload, 0.0, "weighted at {workload}");
            assert_eq!(weighted.node_assignments["n4"], 0.0, "unhealthy n4 at {workload}");

            let least = lb
                .analyze_workload_distribution(
                    &nodes,
                    workload,
                    LoadBalancingStrategy::LeastConnections,
                )
                .unwrap();
            let a = &least.node_assignments;
            let placed = least.assigned_total();
            assert!(
                (placed + least.unassigned_workload - workload).abs() < 1e-9,
                "least-connections lost load at {workload}"
            );
            assert_eq!(
                least.unassigned_workload,
                (workload - total_headroom).max(0.0),
                "leftover at {workload}"
            );
            // Lowest load first, health aside: n4 (0), n3 (100), n1 (200), n2 (600).
            let order = ["n4", "n3", "n1", "n2"];
            for pair in order.windows(2) {
                let earlier = node_by_id(&nodes, pair[0]);
                let later = node_by_id(&nodes, pair[1]);
                if a[pair[1]] > 0.0 {
                    assert_eq!(
                        a[pair[0]],
                        earlier.headroom(),
                        "{} not filled before {} at {workload}",
                        pair[0],
                        pair[1]
                    );
                }
                assert!(a[pair[1]] <= later.headroom());
            }
        }
    }

    fn node_by_id<'a>(nodes: &'a [WorkloadNode], id: &str) -> &'a WorkloadNode {
        nodes.iter().find(|n| n.node_id == id).unwrap()
    }

    #[test]
    fn execute_is_additive() {
        let lb = LoadBalancer::default();
        let nodes = cluster();
        let dist = lb
            .analyze_workload_distribution(&nodes, 1200.0, LoadBalancingStrategy::RoundRobin)
            .unwrap();
        let record = lb.execute_load_balancing(&dist, &nodes);

        assert_eq!(record.total_nodes_balanced, 3);
        assert_eq!(record.status, OrchestrationStatus::Completed);
        let n2 = record.node_results.iter().find(|r| r.node_id == "n2").unwrap();
        assert_eq!(n2.previous_load, 600.0);
        assert_eq!(n2.new_total_load, 1000.0);
        assert_eq!(n2.utilization, 125.0);
    }

    #[test]
    fn execute_with_leftover_is_partial() {
        let lb = LoadBalancer::default();
        let nodes = cluster();
        let dist = lb
            .analyze_workload_distribution(&nodes, 2500.0, LoadBalancingStrategy::LeastConnections)
            .unwrap();
        let record = lb.execute_load_balancing(&dist, &nodes);
        assert_eq!(record.status, OrchestrationStatus::PartialSuccess);
        assert_eq!(record.unassigned_workload, 400.0);
    }

    #[test]
    fn expected_performance_is_assignment_weighted() {
        let lb = LoadBalancer::default();
        let nodes = vec![
            node("a", 100.0, 0.0, 10.0, NodeHealth::Healthy),
            node("b", 100.0, 0.0, 30.0, NodeHealth::Healthy),
        ];
        let dist = lb
            .analyze_workload_distribution(&nodes, 100.0, LoadBalancingStrategy::RoundRobin)
            .unwrap();
        let perf = dist.expected_performance;
        assert!((perf.expected_response_time - 20.0).abs() < 1e-9);
        assert!((perf.expected_utilization - 50.0).abs() < 1e-9);
        assert_eq!(perf.load_distribution_efficiency, 100.0);
        assert!((perf.capacity_utilization - 50.0).abs() < 1e-9);
    }
}
