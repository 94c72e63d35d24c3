//! JSON snapshot consumed by `scalegridd`.
//!
//! Readings arrive as lists, the way a collector emits them, and are keyed
//! by resource type or metric when converted into a request. A later entry
//! for the same key replaces an earlier one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use scalegrid_core::{
    CapabilityRequirement, LoadBalancingStrategy, PerformanceMetric, ResourceMetrics, WorkloadNode,
};

use crate::report::InfiniteScalingRequest;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReading {
    pub metric: PerformanceMetric,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub resource_metrics: Vec<ResourceMetrics>,
    #[serde(default)]
    pub performance_metrics: Vec<PerformanceReading>,
    #[serde(default)]
    pub capability_requirements: Vec<CapabilityRequirement>,
    #[serde(default)]
    pub nodes: Vec<WorkloadNode>,
    #[serde(default)]
    pub total_workload: f64,
    #[serde(default)]
    pub strategy: Option<LoadBalancingStrategy>,
}

impl Snapshot {
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn into_request(self) -> InfiniteScalingRequest {
        let mut resource_metrics = BTreeMap::new();
        for reading in self.resource_metrics {
            let resource = reading.resource_type;
            if resource_metrics.insert(resource, reading).is_some() {
                warn!(resource = %resource, "duplicate resource reading, keeping the last one");
            }
        }

        let mut performance_metrics = BTreeMap::new();
        for reading in self.performance_metrics {
            if performance_metrics
                .insert(reading.metric, reading.value)
                .is_some()
            {
                warn!(metric = %reading.metric, "duplicate performance reading, keeping the last one");
            }
        }

        InfiniteScalingRequest {
            resource_metrics,
            performance_metrics,
            capability_requirements: self.capability_requirements,
            nodes: self.nodes,
            total_workload: self.total_workload,
            strategy: self.strategy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalegrid_core::ResourceType;

    #[test]
    fn parses_partial_snapshot() {
        let snapshot = Snapshot::from_json(
            r#"{
                "resource_metrics": [
                    {"resource_type": "cpu", "current_usage": 85.0, "capacity": 100.0,
                     "utilization_percentage": 85.0}
                ],
                "performance_metrics": [{"metric": "response_time", "value": 250.0}],
                "strategy": "round_robin"
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.resource_metrics.len(), 1);
        assert!(snapshot.nodes.is_empty());
        assert_eq!(snapshot.total_workload, 0.0);
        assert_eq!(snapshot.strategy, Some(LoadBalancingStrategy::RoundRobin));
    }

    #[test]
    fn later_readings_win() {
        let snapshot = Snapshot {
            resource_metrics: vec![
                ResourceMetrics::new(ResourceType::Cpu, 50.0, 100.0),
                ResourceMetrics::new(ResourceType::Cpu, 90.0, 100.0),
            ],
            performance_metrics: vec![
                PerformanceReading {
                    metric: PerformanceMetric::ErrorRate,
                    value: 1.0,
                },
                PerformanceReading {
                    metric: PerformanceMetric::ErrorRate,
                    value: 3.0,
                },
            ],
            ..Snapshot::default()
        };
        let request = snapshot.into_request();

        assert_eq!(request.resource_metrics.len(), 1);
        assert_eq!(request.resource_metrics[&ResourceType::Cpu].current_usage, 90.0);
        assert_eq!(request.performance_metrics[&PerformanceMetric::ErrorRate], 3.0);
    }

    #[test]
    fn rejects_unknown_vocabulary() {
        let err = Snapshot::from_json(r#"{"strategy": "random"}"#);
        assert!(err.is_err());
    }
}
