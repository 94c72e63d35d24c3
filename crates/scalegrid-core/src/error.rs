//! Error types for ScaleGrid.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for orchestration operations.
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

/// Errors surfaced by analysis and execution entry points.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// Malformed or missing input, e.g. workload with no nodes.
    #[error("validation error: {0}")]
    Validation(String),

    /// No node qualified for any share of a positive workload.
    #[error("degenerate distribution: {total_workload} units could not be placed on any of {nodes} nodes")]
    DegenerateDistribution { total_workload: f64, nodes: usize },

    #[error(transparent)]
    Execution(#[from] ExecutionFailure),
}

/// Why a single action's apply step did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    #[error("failed: {error}")]
    Failed { error: String },

    #[error("timed out after {after_ms}ms")]
    TimedOut { after_ms: u64 },

    #[error("cancelled")]
    Cancelled,
}

/// A failed apply step, tagged with what it was applying.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{subject}: {kind}")]
pub struct ExecutionFailure {
    pub subject: String,
    pub kind: FailureKind,
}

impl ExecutionFailure {
    pub fn failed(subject: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            kind: FailureKind::Failed {
                error: error.into(),
            },
        }
    }

    pub fn timed_out(subject: impl Into<String>, after: Duration) -> Self {
        Self {
            subject: subject.into(),
            kind: FailureKind::TimedOut {
                after_ms: after.as_millis() as u64,
            },
        }
    }

    pub fn cancelled(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            kind: FailureKind::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == FailureKind::Cancelled
    }
}

/// Errors loading or validating `scalegrid.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
