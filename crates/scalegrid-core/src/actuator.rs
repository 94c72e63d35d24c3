//! Callback types for the external apply step.
//!
//! ScaleGrid decides; something else applies. Each component takes an
//! optional callback that performs the real work (calling a cloud API,
//! resizing a pool, running a migration step). When none is installed the
//! no-op actuators below are used, which accept every request.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::types::{CapabilityType, PerformanceMetric, ScalingAction};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Applies one scaling action.
pub type ScaleFn = Arc<dyn Fn(ScalingAction) -> BoxFuture<anyhow::Result<()>> + Send + Sync>;

/// Applies one optimization action against a metric, returning the
/// observed improvement (percent).
pub type OptimizeFn =
    Arc<dyn Fn(PerformanceMetric, String) -> BoxFuture<anyhow::Result<f64>> + Send + Sync>;

/// Runs one implementation step of an expansion plan.
pub type StepFn =
    Arc<dyn Fn(CapabilityType, String) -> BoxFuture<anyhow::Result<()>> + Send + Sync>;

/// Improvement reported by the no-op optimizer.
pub const DEFAULT_IMPROVEMENT: f64 = 15.0;

pub fn noop_scale_fn() -> ScaleFn {
    Arc::new(|_action: ScalingAction| -> BoxFuture<anyhow::Result<()>> {
        Box::pin(async { Ok(()) })
    })
}

pub fn noop_optimize_fn() -> OptimizeFn {
    Arc::new(
        |_metric: PerformanceMetric, _action: String| -> BoxFuture<anyhow::Result<f64>> {
            Box::pin(async { Ok(DEFAULT_IMPROVEMENT) })
        },
    )
}

pub fn noop_step_fn() -> StepFn {
    Arc::new(
        |_capability: CapabilityType, _step: String| -> BoxFuture<anyhow::Result<()>> {
            Box::pin(async { Ok(()) })
        },
    )
}
