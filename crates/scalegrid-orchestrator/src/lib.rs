//! scalegrid-orchestrator — scalability orchestration cycles.
//!
//! Composes the resource scaler, performance optimizer, capability
//! expander, and load balancer into plan/execute cycles. Each cycle moves
//! `Planning → Executing → Completed | PartialSuccess | Failed` and is
//! recorded in append-only history that backs the analytics queries.
//!
//! # Components
//!
//! - **`ScalabilityOrchestrator`**: entry points, plan store, component wiring
//! - **`plan`**: plan assembly: resource deltas, timeline, benefits, criteria
//! - **`history`**: lock-protected history logs and scalability analytics
//! - **`report`**: typed request and result structs for every entry point
//! - **`snapshot`**: JSON input format for a full orchestration cycle
//!
//! # Status rules
//!
//! ```text
//! execution : Completed if every action succeeded
//!             PartialSuccess if some succeeded, or the pass was cancelled
//!             Failed otherwise
//! infinite  : Completed if every part Completed
//!             PartialSuccess if any part Completed or PartialSuccess
//!             Failed otherwise
//! ```

pub mod history;
pub mod orchestrator;
pub mod plan;
pub mod report;
pub mod snapshot;

pub use history::{History, OrchestrationKind, OrchestrationRecord, ScalabilityAnalytics};
pub use orchestrator::ScalabilityOrchestrator;
pub use plan::assemble_plan;
pub use report::{
    AnalyticsReport, BalancingOrchestration, ExpansionOrchestration, InfiniteScalingReport,
    InfiniteScalingRequest, ScalabilityExecution, ScalingOutcome,
};
pub use snapshot::{PerformanceReading, Snapshot};
