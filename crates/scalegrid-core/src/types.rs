//! Domain types for ScaleGrid.
//!
//! The enums in the first half of this file are the stable vocabulary shared
//! with the monitoring and actuator collaborators; they serialize as
//! `snake_case` strings. The structs in the second half are the data model
//! flowing through a planning cycle.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Unique identifier for a workload node.
pub type NodeId = String;

/// Declares a `snake_case` vocabulary enum with `as_str`, `Display` and
/// `FromStr`.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($wire => Ok($name::$variant),)+
                    other => Err(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    )),
                }
            }
        }
    };
}

// ── Vocabulary ────────────────────────────────────────────────────

vocabulary! {
    /// A scalable resource class.
    pub enum ResourceType {
        Cpu => "cpu",
        Memory => "memory",
        Storage => "storage",
        Network => "network",
    }
}

vocabulary! {
    /// A performance indicator tracked by the optimizer.
    pub enum PerformanceMetric {
        ResponseTime => "response_time",
        Throughput => "throughput",
        CpuUtilization => "cpu_utilization",
        MemoryUtilization => "memory_utilization",
        ErrorRate => "error_rate",
        Availability => "availability",
    }
}

impl PerformanceMetric {
    /// Whether smaller readings are better for this metric.
    pub fn lower_is_better(&self) -> bool {
        matches!(
            self,
            PerformanceMetric::ResponseTime
                | PerformanceMetric::ErrorRate
                | PerformanceMetric::CpuUtilization
        )
    }
}

vocabulary! {
    /// Direction of a scaling action.
    pub enum ScalingDirection {
        Up => "up",
        Down => "down",
        Out => "out",
        In => "in",
    }
}

impl ScalingDirection {
    /// Whether this direction adds capacity.
    pub fn is_growth(&self) -> bool {
        matches!(self, ScalingDirection::Up | ScalingDirection::Out)
    }
}

vocabulary! {
    /// How a scaling action was derived.
    pub enum ScalingStrategy {
        Reactive => "reactive",
        Predictive => "predictive",
        Proactive => "proactive",
    }
}

vocabulary! {
    /// Rule used to spread a workload across nodes.
    pub enum LoadBalancingStrategy {
        RoundRobin => "round_robin",
        Weighted => "weighted",
        LeastConnections => "least_connections",
        ResponseTime => "response_time",
        ResourceBased => "resource_based",
        Geographic => "geographic",
    }
}

impl Default for LoadBalancingStrategy {
    fn default() -> Self {
        Self::Weighted
    }
}

vocabulary! {
    /// A capability class that can be expanded.
    pub enum CapabilityType {
        Processing => "processing",
        Storage => "storage",
        Networking => "networking",
        Analytics => "analytics",
        Security => "security",
        Integration => "integration",
    }
}

vocabulary! {
    /// How a capability expansion is carried out.
    pub enum ExpansionStrategy {
        Horizontal => "horizontal",
        Vertical => "vertical",
        Hybrid => "hybrid",
        Distributed => "distributed",
    }
}

vocabulary! {
    /// Health of a workload node as reported by the inventory collaborator.
    pub enum NodeHealth {
        Healthy => "healthy",
        Degraded => "degraded",
        Unhealthy => "unhealthy",
        Unknown => "unknown",
    }
}

vocabulary! {
    /// Phase of an orchestration cycle.
    ///
    /// A cycle moves `Planning → Executing → {Completed | PartialSuccess | Failed}`.
    pub enum OrchestrationStatus {
        Planning => "planning",
        Executing => "executing",
        Completed => "completed",
        PartialSuccess => "partial_success",
        Failed => "failed",
    }
}

impl OrchestrationStatus {
    /// Completed or partially successful.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::PartialSuccess)
    }

    /// Terminal status for a pass over `total` independent actions of which
    /// `succeeded` went through.
    ///
    /// A cancelled pass is always `PartialSuccess`; an empty pass is
    /// `Completed`.
    pub fn from_counts(total: usize, succeeded: usize, cancelled: bool) -> Self {
        if cancelled {
            Self::PartialSuccess
        } else if succeeded >= total {
            Self::Completed
        } else if succeeded > 0 {
            Self::PartialSuccess
        } else {
            Self::Failed
        }
    }

    /// Fold sub-orchestration statuses: `Completed` only if every part
    /// completed, `PartialSuccess` if any part succeeded at all.
    pub fn combine<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = OrchestrationStatus>,
    {
        let mut all_completed = true;
        let mut any_success = false;
        let mut seen = false;
        for status in parts {
            seen = true;
            all_completed &= status == Self::Completed;
            any_success |= status.is_success();
        }
        if !seen || all_completed {
            Self::Completed
        } else if any_success {
            Self::PartialSuccess
        } else {
            Self::Failed
        }
    }
}

// ── Resource metrics ──────────────────────────────────────────────

/// One utilization reading for a resource, produced by the monitoring side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetrics {
    pub resource_type: ResourceType,
    pub current_usage: f64,
    pub capacity: f64,
    /// Usage as a percentage of capacity (0–100, may exceed 100).
    pub utilization_percentage: f64,
    /// Rate of change reported by the collector; informational.
    #[serde(default)]
    pub trend: f64,
    /// Unix timestamp (seconds) of the reading.
    #[serde(default)]
    pub timestamp: u64,
}

impl ResourceMetrics {
    /// Build a reading, deriving the utilization from usage and capacity.
    pub fn new(resource_type: ResourceType, current_usage: f64, capacity: f64) -> Self {
        let utilization_percentage = if capacity > 0.0 {
            current_usage / capacity * 100.0
        } else {
            0.0
        };
        Self {
            resource_type,
            current_usage,
            capacity,
            utilization_percentage,
            trend: 0.0,
            timestamp: epoch_secs(),
        }
    }

    /// Whether the reading can be reasoned about at all.
    pub fn is_well_formed(&self) -> bool {
        self.current_usage.is_finite()
            && self.capacity.is_finite()
            && self.utilization_percentage.is_finite()
            && self.capacity > 0.0
            && self.current_usage >= 0.0
    }
}

// ── Actions and plans ─────────────────────────────────────────────

/// Expected effect of an action or plan, by benefit class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Benefits {
    pub performance_improvement: f64,
    pub cost_optimization: f64,
    pub capacity_increase: f64,
    pub availability_improvement: f64,
}

impl Benefits {
    pub fn add(&mut self, other: &Benefits) {
        self.performance_improvement += other.performance_improvement;
        self.cost_optimization += other.cost_optimization;
        self.capacity_increase += other.capacity_increase;
        self.availability_improvement += other.availability_improvement;
    }

    pub fn scaled(&self, factor: f64) -> Benefits {
        Benefits {
            performance_improvement: self.performance_improvement * factor,
            cost_optimization: self.cost_optimization * factor,
            capacity_increase: self.capacity_increase * factor,
            availability_improvement: self.availability_improvement * factor,
        }
    }
}

/// A discrete up/down adjustment proposal for one resource type.
///
/// Immutable once created; re-evaluating the same metrics produces a new
/// action with a new id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingAction {
    pub action_id: String,
    pub resource_type: ResourceType,
    pub direction: ScalingDirection,
    /// Capacity delta, always non-negative; the direction gives the sign.
    pub magnitude: f64,
    pub strategy: ScalingStrategy,
    /// 4 (routine) to 10 (urgent).
    pub priority: u8,
    pub estimated_duration_secs: u64,
    pub expected_impact: Benefits,
    pub prerequisites: Vec<String>,
    pub rollback_plan: Vec<String>,
    /// Cost delta; negative for savings.
    pub cost_estimate: f64,
    /// 0.0–1.0.
    pub risk_level: f64,
}

impl ScalingAction {
    /// Magnitude with the direction applied.
    pub fn signed_magnitude(&self) -> f64 {
        if self.direction.is_growth() {
            self.magnitude
        } else {
            -self.magnitude
        }
    }
}

/// A metric that misses its tolerance band, with the remedies to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceTarget {
    pub metric: PerformanceMetric,
    pub target_value: f64,
    pub current_value: f64,
    pub tolerance: f64,
    pub priority: u8,
    pub optimization_actions: Vec<String>,
}

/// Aggregate plan produced by one scalability orchestration cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalabilityPlan {
    pub plan_id: String,
    pub created_at: u64,
    pub scaling_actions: Vec<ScalingAction>,
    pub performance_targets: Vec<PerformanceTarget>,
    /// Net capacity delta per resource type.
    pub resource_requirements: BTreeMap<ResourceType, f64>,
    /// Item key → scheduled unix timestamp (seconds).
    pub timeline: BTreeMap<String, u64>,
    pub success_criteria: Vec<String>,
    pub monitoring_metrics: Vec<String>,
    pub rollback_strategy: Vec<String>,
    pub estimated_cost: f64,
    pub expected_benefits: Benefits,
}

// ── Capability expansion ──────────────────────────────────────────

/// A capacity need for one capability, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityRequirement {
    pub capability_type: CapabilityType,
    pub required_capacity: f64,
    pub current_capacity: f64,
    /// Caller-supplied urgency on a 0–10 scale.
    pub expansion_urgency: u8,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,
    #[serde(default)]
    pub success_metrics: Vec<String>,
}

impl CapabilityRequirement {
    pub fn new(
        capability_type: CapabilityType,
        required_capacity: f64,
        current_capacity: f64,
        expansion_urgency: u8,
    ) -> Self {
        Self {
            capability_type,
            required_capacity,
            current_capacity,
            expansion_urgency,
            dependencies: Vec::new(),
            constraints: BTreeMap::new(),
            success_metrics: Vec::new(),
        }
    }
}

/// Approximate resource budget for an expansion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceBudget {
    pub cpu: f64,
    pub memory: f64,
    pub storage: f64,
    pub network: f64,
}

/// Risk factors of an expansion, each on a 0.0–1.0 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub implementation_risk: f64,
    pub performance_impact: f64,
    pub cost_overrun: f64,
    pub timeline_delay: f64,
    pub rollback_complexity: f64,
}

impl Default for RiskAssessment {
    fn default() -> Self {
        Self {
            implementation_risk: 0.2,
            performance_impact: 0.1,
            cost_overrun: 0.15,
            timeline_delay: 0.25,
            rollback_complexity: 0.3,
        }
    }
}

/// A multi-step plan to grow one capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionPlan {
    pub expansion_id: String,
    pub capability_type: CapabilityType,
    pub strategy: ExpansionStrategy,
    pub urgency: u8,
    pub capacity_increase: f64,
    pub implementation_steps: Vec<String>,
    pub resource_requirements: ResourceBudget,
    pub timeline_secs: u64,
    pub cost_estimate: f64,
    pub risk_assessment: RiskAssessment,
    pub rollback_plan: Vec<String>,
}

// ── Load distribution ─────────────────────────────────────────────

/// A node snapshot supplied by the inventory side for one balancing cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadNode {
    pub node_id: NodeId,
    pub capacity: f64,
    pub current_load: f64,
    /// Mean response time in milliseconds.
    pub response_time: f64,
    pub health_status: NodeHealth,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl WorkloadNode {
    pub fn is_healthy(&self) -> bool {
        self.health_status == NodeHealth::Healthy
    }

    pub fn headroom(&self) -> f64 {
        (self.capacity - self.current_load).max(0.0)
    }

    pub fn is_well_formed(&self) -> bool {
        self.capacity.is_finite()
            && self.current_load.is_finite()
            && self.response_time.is_finite()
            && self.capacity > 0.0
            && self.current_load >= 0.0
            && self.response_time >= 0.0
    }
}

/// Predicted effect of a distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedPerformance {
    /// Assignment-weighted response time (ms).
    pub expected_response_time: f64,
    /// Assignment-weighted post-assignment utilization (%).
    pub expected_utilization: f64,
    /// Share of nodes that received load and are healthy (%).
    pub load_distribution_efficiency: f64,
    /// Assigned workload as a share of total capacity (%).
    pub capacity_utilization: f64,
}

/// An assignment of a total workload across a set of nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadDistribution {
    pub distribution_id: String,
    pub strategy: LoadBalancingStrategy,
    pub total_workload: f64,
    /// Node id → assigned load. Keys are always input node ids.
    pub node_assignments: BTreeMap<NodeId, f64>,
    /// Workload no node had headroom for.
    pub unassigned_workload: f64,
    pub expected_performance: ExpectedPerformance,
    pub load_balancing_rules: Vec<String>,
    pub monitoring_metrics: Vec<String>,
}

impl WorkloadDistribution {
    pub fn assigned_total(&self) -> f64 {
        self.node_assignments.values().sum()
    }
}

/// Current unix timestamp in seconds.
pub fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
