//! scalegrid-scaler — threshold-driven resource scaling.
//!
//! Reads `ResourceMetrics`, compares utilization against the policy for the
//! resource type, and emits `ScalingAction`s. Applying them goes through a
//! caller-supplied `ScaleFn` on the bounded executor.
//!
//! # Scaling Algorithm
//!
//! ```text
//! policy      = policies[resource_type] or default (80 / 30 / 1.5)
//! utilization = current_usage / capacity * 100
//!
//! if utilization > scale_up_threshold:
//!     magnitude = capacity * scale_factor - capacity
//!     priority  = priority(utilization, scale_up_threshold)
//!
//! if utilization < scale_down_threshold:
//!     magnitude = capacity - capacity / scale_factor
//!     only if capacity - magnitude > current_usage * safety_margin
//!     priority  = priority(100 - utilization, 100 - scale_down_threshold)
//!
//! priority(s, t) = 10 if s > 1.5t, 8 if s > 1.2t, 6 if s > t, else 4
//! ```

pub mod analytics;
pub mod scaler;

pub use analytics::{ScalingAnalytics, ScalingRecord, scaling_analytics};
pub use scaler::{ResourceScaler, calculate_priority};
