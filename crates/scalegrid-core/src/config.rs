//! scalegrid.toml configuration parser.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the stock policies:
//!
//! ```toml
//! [scaler]
//! safety_margin = 1.2
//!
//! [scaler.policies.cpu]
//! scale_up_threshold = 80.0
//! scale_down_threshold = 30.0
//! scale_factor = 1.5
//!
//! [executor]
//! max_concurrency = 8
//! action_timeout_secs = 30
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::policy::PolicyTable;
use crate::types::{
    CapabilityType, ExpansionStrategy, LoadBalancingStrategy, PerformanceMetric, ResourceType,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalegridConfig {
    pub scaler: ScalerConfig,
    pub optimizer: OptimizerConfig,
    pub expansion: ExpansionConfig,
    pub balancer: BalancerConfig,
    pub executor: ExecutorConfig,
}

// ── Resource scaling ──────────────────────────────────────────────

/// Threshold policy for one resource type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    /// Utilization (%) above which capacity is grown.
    pub scale_up_threshold: f64,
    /// Utilization (%) below which capacity may be shrunk.
    pub scale_down_threshold: f64,
    /// Growth multiplier; shrinking divides by the same factor.
    pub scale_factor: f64,
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self {
            scale_up_threshold: 80.0,
            scale_down_threshold: 30.0,
            scale_factor: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalerConfig {
    /// Policy for resource types without an explicit entry.
    pub default_policy: ScalingPolicy,
    /// Per-resource policies keyed by resource name ("cpu", "memory", ...).
    pub policies: BTreeMap<String, ScalingPolicy>,
    /// A scale-down must leave capacity above `current_usage * safety_margin`.
    pub safety_margin: f64,
}

/// Stock `scaler.safety_margin`.
pub const DEFAULT_SAFETY_MARGIN: f64 = 1.2;

impl Default for ScalerConfig {
    fn default() -> Self {
        let stock = Self::stock_policies();
        Self {
            default_policy: *stock.default_policy(),
            policies: stock.to_named(),
            safety_margin: DEFAULT_SAFETY_MARGIN,
        }
    }
}

impl ScalerConfig {
    /// Stock per-resource policies. Memory runs hotter and grows slower.
    pub fn stock_policies() -> PolicyTable<ResourceType, ScalingPolicy> {
        PolicyTable::new(ScalingPolicy::default())
            .with(ResourceType::Cpu, ScalingPolicy::default())
            .with(
                ResourceType::Memory,
                ScalingPolicy {
                    scale_up_threshold: 85.0,
                    scale_down_threshold: 40.0,
                    scale_factor: 1.3,
                },
            )
    }

    pub fn policy_table(&self) -> Result<PolicyTable<ResourceType, ScalingPolicy>, ConfigError> {
        PolicyTable::from_named(self.default_policy, self.policies.iter())
    }
}

// ── Performance optimization ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Relative band around a target within which a metric is acceptable.
    pub tolerance: f64,
    /// Optimal value per metric name. Metrics absent here are never flagged.
    pub targets: BTreeMap<String, f64>,
}

/// Stock `optimizer.tolerance`.
pub const DEFAULT_TOLERANCE: f64 = 0.2;

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            targets: Self::stock_targets()
                .into_iter()
                .map(|(metric, value)| (metric.to_string(), value))
                .collect(),
        }
    }
}

impl OptimizerConfig {
    /// Stock optimal values. Memory utilization has no target.
    pub fn stock_targets() -> BTreeMap<PerformanceMetric, f64> {
        [
            (PerformanceMetric::ResponseTime, 100.0),
            (PerformanceMetric::Throughput, 10_000.0),
            (PerformanceMetric::CpuUtilization, 70.0),
            (PerformanceMetric::ErrorRate, 0.1),
            (PerformanceMetric::Availability, 99.9),
        ]
        .into_iter()
        .collect()
    }

    pub fn target_table(&self) -> Result<BTreeMap<PerformanceMetric, f64>, ConfigError> {
        self.targets
            .iter()
            .map(|(name, value)| {
                name.parse::<PerformanceMetric>()
                    .map(|metric| (metric, *value))
                    .map_err(ConfigError::Invalid)
            })
            .collect()
    }
}

// ── Capability expansion ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpansionPolicy {
    /// Required/current ratio (%) above which expansion is triggered.
    pub expansion_threshold: f64,
    /// Minimum growth multiplier applied to current capacity.
    pub expansion_factor: f64,
    pub preferred_strategy: ExpansionStrategy,
}

impl Default for ExpansionPolicy {
    fn default() -> Self {
        Self {
            expansion_threshold: 80.0,
            expansion_factor: 1.5,
            preferred_strategy: ExpansionStrategy::Horizontal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    pub default_policy: ExpansionPolicy,
    /// Per-capability policies keyed by capability name.
    pub policies: BTreeMap<String, ExpansionPolicy>,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        let stock = Self::stock_policies();
        Self {
            default_policy: *stock.default_policy(),
            policies: stock.to_named(),
        }
    }
}

impl ExpansionConfig {
    pub fn stock_policies() -> PolicyTable<CapabilityType, ExpansionPolicy> {
        let policy = |expansion_threshold, expansion_factor, preferred_strategy| ExpansionPolicy {
            expansion_threshold,
            expansion_factor,
            preferred_strategy,
        };
        PolicyTable::new(ExpansionPolicy::default())
            .with(
                CapabilityType::Processing,
                policy(85.0, 2.0, ExpansionStrategy::Horizontal),
            )
            .with(
                CapabilityType::Storage,
                policy(80.0, 1.5, ExpansionStrategy::Vertical),
            )
            .with(
                CapabilityType::Networking,
                policy(75.0, 1.8, ExpansionStrategy::Distributed),
            )
    }

    pub fn policy_table(
        &self,
    ) -> Result<PolicyTable<CapabilityType, ExpansionPolicy>, ConfigError> {
        PolicyTable::from_named(self.default_policy, self.policies.iter())
    }
}

// ── Load balancing ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Strategy used when a caller does not pick one.
    pub default_strategy: LoadBalancingStrategy,
}

// ── Execution ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Upper bound on actions applied concurrently within one pass.
    pub max_concurrency: usize,
    /// Per-action timeout for actuator calls.
    pub action_timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            action_timeout_secs: 30,
        }
    }
}

impl ExecutorConfig {
    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }
}

// ── Loading ───────────────────────────────────────────────────────

impl ScalegridConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate config text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ScalegridConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values no policy can be built from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut scaling = vec![("default".to_string(), self.scaler.default_policy)];
        scaling.extend(self.scaler.policies.iter().map(|(k, v)| (k.clone(), *v)));
        for (name, policy) in &scaling {
            validate_scaling_policy(name, policy)?;
        }
        if !(self.scaler.safety_margin.is_finite() && self.scaler.safety_margin >= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "scaler.safety_margin must be >= 1.0, got {}",
                self.scaler.safety_margin
            )));
        }
        self.scaler.policy_table()?;

        let tolerance = self.optimizer.tolerance;
        if !(tolerance > 0.0 && tolerance < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "optimizer.tolerance must be in (0, 1), got {tolerance}"
            )));
        }
        for (name, value) in &self.optimizer.targets {
            if !value.is_finite() || *value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "optimizer target '{name}' must be a non-negative number, got {value}"
                )));
            }
        }
        self.optimizer.target_table()?;

        let mut expansion = vec![("default".to_string(), self.expansion.default_policy)];
        expansion.extend(self.expansion.policies.iter().map(|(k, v)| (k.clone(), *v)));
        for (name, policy) in &expansion {
            if !(0.0..=100.0).contains(&policy.expansion_threshold) {
                return Err(ConfigError::Invalid(format!(
                    "expansion policy '{name}': threshold must be within 0-100"
                )));
            }
            if !(policy.expansion_factor.is_finite() && policy.expansion_factor > 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "expansion policy '{name}': expansion_factor must be > 1.0"
                )));
            }
        }
        self.expansion.policy_table()?;

        if self.executor.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "executor.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.executor.action_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "executor.action_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_scaling_policy(name: &str, policy: &ScalingPolicy) -> Result<(), ConfigError> {
    let in_range = |v: f64| (0.0..=100.0).contains(&v);
    if !in_range(policy.scale_up_threshold) || !in_range(policy.scale_down_threshold) {
        return Err(ConfigError::Invalid(format!(
            "scaling policy '{name}': thresholds must be within 0-100"
        )));
    }
    if policy.scale_down_threshold >= policy.scale_up_threshold {
        return Err(ConfigError::Invalid(format!(
            "scaling policy '{name}': scale_down_threshold must be below scale_up_threshold"
        )));
    }
    if !(policy.scale_factor.is_finite() && policy.scale_factor > 1.0) {
        return Err(ConfigError::Invalid(format!(
            "scaling policy '{name}': scale_factor must be > 1.0"
        )));
    }
    Ok(())
}
