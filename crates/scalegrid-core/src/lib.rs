//! scalegrid-core — shared vocabulary for the ScaleGrid orchestration core.
//!
//! Every other ScaleGrid crate speaks in terms of the types defined here:
//! metric readings flowing in from the monitoring side, actions and plans
//! flowing out to the actuator side, and the policy tables that turn one
//! into the other.
//!
//! # Components
//!
//! - **`types`**: wire vocabulary enums and the data model
//! - **`policy`**: enum-keyed policy tables with an explicit default
//! - **`config`**: `scalegrid.toml` parsing and validation
//! - **`error`**: validation / degenerate / execution error taxonomy
//! - **`actuator`**: callback types for the external apply step
//! - **`executor`**: bounded fan-out with timeouts and cancellation

pub mod actuator;
pub mod config;
pub mod error;
pub mod executor;
pub mod policy;
pub mod types;

pub use actuator::{BoxFuture, OptimizeFn, ScaleFn, StepFn};
pub use config::{
    BalancerConfig, DEFAULT_SAFETY_MARGIN, DEFAULT_TOLERANCE, ExecutorConfig, ExpansionConfig,
    ExpansionPolicy, OptimizerConfig, ScalegridConfig, ScalerConfig, ScalingPolicy,
};
pub use error::{
    ConfigError, ExecutionFailure, FailureKind, OrchestrationError, OrchestrationResult,
};
pub use executor::{ActionOutcome, CancelHandle, CancelSignal, ExecutionContext, cancel_pair};
pub use policy::PolicyTable;
pub use types::*;
