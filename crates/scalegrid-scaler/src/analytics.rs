//! Scaling history records and the summary computed over them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use scalegrid_core::{ResourceType, ScalingAction, ScalingDirection, epoch_secs};

/// One successfully applied scaling action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingRecord {
    pub action_id: String,
    pub resource_type: ResourceType,
    pub direction: ScalingDirection,
    pub magnitude: f64,
    pub cost_estimate: f64,
    pub executed_at: u64,
}

impl ScalingRecord {
    pub fn from_action(action: &ScalingAction) -> Self {
        Self {
            action_id: action.action_id.clone(),
            resource_type: action.resource_type,
            direction: action.direction,
            magnitude: action.magnitude,
            cost_estimate: action.cost_estimate,
            executed_at: epoch_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalingAnalytics {
    pub total_actions: usize,
    pub by_direction: BTreeMap<ScalingDirection, usize>,
    /// Net signed magnitude applied per resource type.
    pub net_magnitude: BTreeMap<ResourceType, f64>,
    pub total_cost: f64,
    pub last_executed_at: Option<u64>,
}

pub fn scaling_analytics(history: &[ScalingRecord]) -> ScalingAnalytics {
    let mut analytics = ScalingAnalytics {
        total_actions: history.len(),
        ..ScalingAnalytics::default()
    };

    for record in history {
        *analytics.by_direction.entry(record.direction).or_insert(0) += 1;
        let signed = if record.direction.is_growth() {
            record.magnitude
        } else {
            -record.magnitude
        };
        *analytics
            .net_magnitude
            .entry(record.resource_type)
            .or_insert(0.0) += signed;
        analytics.total_cost += record.cost_estimate;
    }
    analytics.last_executed_at = history.iter().map(|r| r.executed_at).max();
    analytics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rt: ResourceType, direction: ScalingDirection, magnitude: f64) -> ScalingRecord {
        ScalingRecord {
            action_id: format!("scale-{direction}-{rt}"),
            resource_type: rt,
            direction,
            magnitude,
            cost_estimate: if direction.is_growth() { magnitude * 0.1 } else { -magnitude * 0.1 },
            executed_at: 1000,
        }
    }

    #[test]
    fn empty_history() {
        let analytics = scaling_analytics(&[]);
        assert_eq!(analytics.total_actions, 0);
        assert!(analytics.by_direction.is_empty());
        assert_eq!(analytics.last_executed_at, None);
    }

    #[test]
    fn nets_growth_against_shrink() {
        let history = vec![
            record(ResourceType::Cpu, ScalingDirection::Up, 50.0),
            record(ResourceType::Cpu, ScalingDirection::Down, 20.0),
            record(ResourceType::Memory, ScalingDirection::Up, 30.0),
        ];
        let analytics = scaling_analytics(&history);

        assert_eq!(analytics.total_actions, 3);
        assert_eq!(analytics.by_direction[&ScalingDirection::Up], 2);
        assert_eq!(analytics.by_direction[&ScalingDirection::Down], 1);
        assert!((analytics.net_magnitude[&ResourceType::Cpu] - 30.0).abs() < 1e-9);
        assert!((analytics.total_cost - 6.0).abs() < 1e-9);
        assert_eq!(analytics.last_executed_at, Some(1000));
    }

    #[test]
    fn serializes_with_wire_names() {
        let analytics = scaling_analytics(&[record(ResourceType::Cpu, ScalingDirection::Up, 1.0)]);
        let json = serde_json::to_value(&analytics).unwrap();
        assert_eq!(json["by_direction"]["up"], 1);
    }
}
