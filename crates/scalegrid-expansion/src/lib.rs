//! scalegrid-expansion — capability expansion planning and execution.
//!
//! Turns `CapabilityRequirement`s into `ExpansionPlan`s with a resource
//! budget, risk profile, timeline, cost, and rollback plan, then runs a
//! plan's implementation steps one at a time through a `StepFn`.
//!
//! # Components
//!
//! - **`CapabilityExpander`**: policy lookup, trigger check, plan assembly,
//!   sequential step execution with halt-on-failure
//! - **`plan`**: per-strategy step lists, budgets, risk and cost models
//! - **`analytics`**: execution records and their summary
//!
//! Expansion is triggered when `required / current * 100` exceeds the
//! policy threshold (a zero current capacity counts as 100%) or when the
//! caller marks the requirement with urgency above 7.

pub mod analytics;
pub mod expander;
pub mod plan;

pub use analytics::{
    ExpansionAnalytics, ExpansionRecord, ExpansionStatus, StepRecord, expansion_analytics,
};
pub use expander::CapabilityExpander;
