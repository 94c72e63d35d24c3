//! Plan models: steps, budgets, risk, timeline, and cost.
//!
//! Everything here is a pure function of the capability, strategy, urgency,
//! and capacity increase.

use scalegrid_core::{CapabilityType, ExpansionStrategy, ResourceBudget, RiskAssessment};

/// Baseline implementation time before strategy and size adjustments.
pub const BASE_TIMELINE_SECS: f64 = 2.0 * 3600.0;

const BASE_STEPS: [&str; 5] = [
    "Validate current capability baseline",
    "Prepare expansion environment",
    "Execute capability expansion",
    "Validate expanded capability",
    "Update monitoring and alerting",
];

const BASE_ROLLBACK: [&str; 5] = [
    "Stop new traffic to expanded capability",
    "Validate original capability still functional",
    "Migrate workload back to original capability",
    "Remove expanded resources",
    "Restore original configuration",
];

pub fn implementation_steps(strategy: ExpansionStrategy) -> Vec<String> {
    let specific: [&str; 3] = match strategy {
        ExpansionStrategy::Horizontal => [
            "Deploy additional instances",
            "Configure load balancing",
            "Test distributed functionality",
        ],
        ExpansionStrategy::Vertical => [
            "Scale up existing resources",
            "Optimize resource allocation",
            "Test enhanced capacity",
        ],
        ExpansionStrategy::Hybrid => [
            "Deploy additional instances",
            "Scale up existing resources",
            "Test enhanced capacity",
        ],
        ExpansionStrategy::Distributed => [
            "Deploy across multiple regions",
            "Configure cross-region synchronization",
            "Test distributed resilience",
        ],
    };
    BASE_STEPS
        .iter()
        .chain(specific.iter())
        .map(|s| s.to_string())
        .collect()
}

pub fn rollback_plan(strategy: ExpansionStrategy) -> Vec<String> {
    let specific: [&str; 2] = match strategy {
        ExpansionStrategy::Horizontal => [
            "Remove additional instances from load balancer",
            "Terminate additional instances",
        ],
        ExpansionStrategy::Vertical => [
            "Scale down resources to original levels",
            "Restart services with original configuration",
        ],
        ExpansionStrategy::Hybrid => [
            "Remove additional instances from load balancer",
            "Scale down resources to original levels",
        ],
        ExpansionStrategy::Distributed => [
            "Remove distributed endpoints",
            "Consolidate to original region",
        ],
    };
    BASE_ROLLBACK
        .iter()
        .chain(specific.iter())
        .map(|s| s.to_string())
        .collect()
}

/// Resource budget for growing `capability` by `increase` units.
pub fn resource_budget(capability: CapabilityType, increase: f64) -> ResourceBudget {
    let mut budget = ResourceBudget {
        cpu: increase * 0.5,
        memory: increase * 0.3,
        storage: increase * 0.2,
        network: increase * 0.1,
    };
    match capability {
        CapabilityType::Processing => budget.cpu *= 2.0,
        CapabilityType::Storage => budget.storage *= 3.0,
        CapabilityType::Networking => budget.network *= 4.0,
        _ => {}
    }
    budget
}

/// Risk profile for a strategy at a given urgency (0–10).
pub fn assess_risk(strategy: ExpansionStrategy, urgency: u8) -> RiskAssessment {
    let mut risk = RiskAssessment::default();
    match strategy {
        ExpansionStrategy::Distributed => {
            risk.implementation_risk *= 1.5;
            risk.rollback_complexity *= 2.0;
        }
        ExpansionStrategy::Vertical => risk.performance_impact *= 0.5,
        _ => {}
    }

    let factor = 1.0 + f64::from(urgency) / 10.0 * 0.2;
    risk.implementation_risk *= factor;
    risk.performance_impact *= factor;
    risk.cost_overrun *= factor;
    risk.timeline_delay *= factor;
    risk.rollback_complexity *= factor;
    risk
}

pub fn strategy_multiplier(strategy: ExpansionStrategy) -> f64 {
    match strategy {
        ExpansionStrategy::Horizontal => 1.5,
        ExpansionStrategy::Vertical => 1.0,
        ExpansionStrategy::Hybrid => 2.0,
        ExpansionStrategy::Distributed => 3.0,
    }
}

/// Estimated implementation time in seconds.
pub fn timeline_secs(strategy: ExpansionStrategy, increase: f64) -> u64 {
    let secs = BASE_TIMELINE_SECS * strategy_multiplier(strategy) * (1.0 + increase / 1000.0);
    secs.max(0.0).round() as u64
}

pub fn unit_cost(capability: CapabilityType) -> f64 {
    match capability {
        CapabilityType::Processing => 0.1,
        CapabilityType::Storage => 0.05,
        CapabilityType::Networking => 0.08,
        CapabilityType::Analytics => 0.12,
        CapabilityType::Security => 0.15,
        CapabilityType::Integration => 0.07,
    }
}

pub fn cost_estimate(capability: CapabilityType, increase: f64) -> f64 {
    increase * unit_cost(capability)
}
