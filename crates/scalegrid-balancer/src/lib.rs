//! scalegrid-balancer — workload distribution across nodes.
//!
//! Given a node roster and a total workload, computes a per-node
//! assignment under a `LoadBalancingStrategy` and applies it.
//!
//! # Strategies
//!
//! | Strategy | Rule |
//! |---|---|
//! | `round_robin` | equal share to every node regardless of health |
//! | `weighted` | healthy nodes by capacity × speed × free share |
//! | `least_connections` | least-loaded first, filling free headroom |
//! | `response_time` | healthy nodes by inverse response time |
//! | `resource_based`, `geographic` | same as `weighted` |
//!
//! Workload no node has room for is reported as unassigned rather than
//! forced onto a full node.

pub mod analytics;
pub mod balancer;
pub mod strategy;

pub use analytics::{BalancingAnalytics, BalancingRecord, NodeBalance, balancing_analytics};
pub use balancer::LoadBalancer;
pub use strategy::{Allocation, allocate, effective_strategy};
