//! scalegrid-optimizer — performance targets and their remedies.
//!
//! Compares performance readings against optimal targets, flags the
//! metrics that fall outside the tolerance band, and runs each flagged
//! metric's remedy list through a caller-supplied `OptimizeFn`.
//!
//! # Flagging
//!
//! ```text
//! lower is better  (response_time, error_rate, cpu_utilization):
//!     flagged if current > target * (1 + tolerance)
//! higher is better (throughput, availability, memory_utilization):
//!     flagged if current < target * (1 - tolerance)
//!
//! deviation = |current - target| / target
//! priority  = 10 if deviation > 0.5, 8 if > 0.3, 6 if > 0.1, else 4
//! ```

pub mod analytics;
pub mod optimizer;

pub use analytics::{PerformanceAnalytics, performance_analytics};
pub use optimizer::{
    OptimizationRecord, OptimizationReport, PerformanceOptimizer, deviation_priority,
    needs_optimization, remedies_for,
};
