//! Expansion execution records and their summary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use scalegrid_core::{CapabilityType, ExecutionFailure, ExpansionStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionStatus {
    /// Every step went through.
    Completed,
    /// A step failed or timed out; later steps were not attempted.
    Halted,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: String,
    pub completed_at: u64,
}

/// Outcome of executing one expansion plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionRecord {
    pub expansion_id: String,
    pub capability_type: CapabilityType,
    pub strategy: ExpansionStrategy,
    pub status: ExpansionStatus,
    pub completed_steps: Vec<StepRecord>,
    pub failed_step: Option<String>,
    pub failure: Option<ExecutionFailure>,
    /// Planned increase when completed, otherwise 0.
    pub actual_capacity_increase: f64,
    pub started_at: u64,
    pub finished_at: u64,
}

impl ExpansionRecord {
    pub fn is_completed(&self) -> bool {
        self.status == ExpansionStatus::Completed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpansionAnalytics {
    pub total_expansions: usize,
    pub completed: usize,
    pub halted: usize,
    pub cancelled: usize,
    pub success_rate: f64,
    pub capacity_added: BTreeMap<CapabilityType, f64>,
    pub most_used_strategy: Option<ExpansionStrategy>,
}

pub fn expansion_analytics(history: &[ExpansionRecord]) -> ExpansionAnalytics {
    let mut analytics = ExpansionAnalytics {
        total_expansions: history.len(),
        ..ExpansionAnalytics::default()
    };
    let mut strategy_counts: BTreeMap<ExpansionStrategy, usize> = BTreeMap::new();

    for record in history {
        match record.status {
            ExpansionStatus::Completed => analytics.completed += 1,
            ExpansionStatus::Halted => analytics.halted += 1,
            ExpansionStatus::Cancelled => analytics.cancelled += 1,
        }
        *analytics
            .capacity_added
            .entry(record.capability_type)
            .or_insert(0.0) += record.actual_capacity_increase;
        *strategy_counts.entry(record.strategy).or_insert(0) += 1;
    }

    if !history.is_empty() {
        analytics.success_rate = analytics.completed as f64 / history.len() as f64;
    }
    // Ties resolve to the strategy that sorts first.
    analytics.most_used_strategy = strategy_counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(strategy, _)| *strategy);
    analytics
}
