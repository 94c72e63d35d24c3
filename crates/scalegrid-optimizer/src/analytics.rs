//! Optimization history summary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use scalegrid_core::{ActionOutcome, PerformanceMetric};

use crate::optimizer::OptimizationRecord;

/// Success rate is measured over this many most recent records.
pub const RECENT_WINDOW: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAnalytics {
    pub total_optimizations: usize,
    /// Share of successful outcomes among the most recent records (0.0–1.0).
    pub success_rate: f64,
    /// Mean improvement over completed actions.
    pub average_improvement: f64,
    pub by_metric: BTreeMap<PerformanceMetric, usize>,
}

pub fn performance_analytics(history: &[OptimizationRecord]) -> PerformanceAnalytics {
    if history.is_empty() {
        return PerformanceAnalytics::default();
    }

    let recent = &history[history.len().saturating_sub(RECENT_WINDOW)..];
    let recent_successes = recent.iter().filter(|r| r.outcome.is_success()).count();

    let completed: Vec<f64> = history
        .iter()
        .filter(|r| r.outcome == ActionOutcome::Completed)
        .map(|r| r.improvement)
        .collect();
    let average_improvement = if completed.is_empty() {
        0.0
    } else {
        completed.iter().sum::<f64>() / completed.len() as f64
    };

    let mut by_metric = BTreeMap::new();
    for record in history {
        *by_metric.entry(record.metric).or_insert(0) += 1;
    }

    PerformanceAnalytics {
        total_optimizations: history.len(),
        success_rate: recent_successes as f64 / recent.len() as f64,
        average_improvement,
        by_metric,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(outcome: ActionOutcome, improvement: f64) -> OptimizationRecord {
        OptimizationRecord {
            metric: PerformanceMetric::ResponseTime,
            action: "Implement caching".to_string(),
            outcome,
            improvement,
            recorded_at: 1000,
        }
    }

    #[test]
    fn mixed_history() {
        let history = vec![
            record(ActionOutcome::Completed, 15.0),
            record(ActionOutcome::Completed, 20.0),
            record(
                ActionOutcome::Failed {
                    error: "boom".into(),
                },
                0.0,
            ),
        ];
        let analytics = performance_analytics(&history);

        assert_eq!(analytics.total_optimizations, 3);
        assert!((analytics.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((analytics.average_improvement - 17.5).abs() < 1e-9);
        assert_eq!(analytics.by_metric[&PerformanceMetric::ResponseTime], 3);
    }

    #[test]
    fn success_rate_uses_recent_window() {
        let mut history: Vec<_> = (0..10)
            .map(|_| record(ActionOutcome::Cancelled, 0.0))
            .collect();
        history.extend((0..RECENT_WINDOW).map(|_| record(ActionOutcome::Completed, 10.0)));

        let analytics = performance_analytics(&history);
        assert_eq!(analytics.total_optimizations, 30);
        assert_eq!(analytics.success_rate, 1.0);
    }

    #[test]
    fn empty_history_is_all_zero() {
        assert_eq!(performance_analytics(&[]), PerformanceAnalytics::default());
    }
}
