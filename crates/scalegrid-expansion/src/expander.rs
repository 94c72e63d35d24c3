//! Capability expander.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use scalegrid_core::actuator::noop_step_fn;
use scalegrid_core::*;

use crate::analytics::{ExpansionRecord, ExpansionStatus, StepRecord};
use crate::plan;

/// Urgency above which a requirement expands regardless of utilization.
pub const URGENCY_OVERRIDE: u8 = 7;
/// Highest urgency a caller may supply.
pub const MAX_URGENCY: u8 = 10;

pub struct CapabilityExpander {
    policies: PolicyTable<CapabilityType, ExpansionPolicy>,
    step_fn: StepFn,
    sequence: AtomicU64,
}

impl Default for CapabilityExpander {
    fn default() -> Self {
        Self::with_policies(ExpansionConfig::stock_policies())
    }
}

impl CapabilityExpander {
    /// Create an expander from the `[expansion]` config section.
    pub fn new(config: &ExpansionConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_policies(config.policy_table()?))
    }

    pub fn with_policies(policies: PolicyTable<CapabilityType, ExpansionPolicy>) -> Self {
        Self {
            policies,
            step_fn: noop_step_fn(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Set the callback used to run implementation steps.
    pub fn with_step_fn(mut self, f: StepFn) -> Self {
        self.step_fn = f;
        self
    }

    pub fn policy(&self, capability: CapabilityType) -> &ExpansionPolicy {
        self.policies.resolve(&capability)
    }

    /// Build a plan for every requirement that needs one, most urgent and
    /// largest first.
    pub fn analyze_capability_needs(
        &self,
        requirements: &[CapabilityRequirement],
    ) -> Vec<ExpansionPlan> {
        let mut plans: Vec<ExpansionPlan> = requirements
            .iter()
            .filter(|req| is_valid(req))
            .filter(|req| self.needs_expansion(req))
            .map(|req| self.create_plan(req))
            .collect();

        plans.sort_by(|a, b| {
            b.urgency
                .cmp(&a.urgency)
                .then(b.capacity_increase.total_cmp(&a.capacity_increase))
        });
        plans
    }

    /// Utilization or urgency trigger.
    pub fn needs_expansion(&self, req: &CapabilityRequirement) -> bool {
        let utilization = if req.current_capacity > 0.0 {
            req.required_capacity / req.current_capacity * 100.0
        } else {
            100.0
        };
        let threshold = self.policy(req.capability_type).expansion_threshold;
        let triggered = utilization > threshold || req.expansion_urgency > URGENCY_OVERRIDE;
        debug!(
            capability = %req.capability_type,
            utilization,
            threshold,
            urgency = req.expansion_urgency,
            triggered,
            "capability need evaluated"
        );
        triggered
    }

    fn create_plan(&self, req: &CapabilityRequirement) -> ExpansionPlan {
        let capability = req.capability_type;
        let policy = self.policy(capability);
        let strategy = policy.preferred_strategy;

        let capacity_increase = (req.required_capacity - req.current_capacity)
            .max(req.current_capacity * (policy.expansion_factor - 1.0));

        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        ExpansionPlan {
            expansion_id: format!("expand-{capability}-{seq}"),
            capability_type: capability,
            strategy,
            urgency: req.expansion_urgency,
            capacity_increase,
            implementation_steps: plan::implementation_steps(strategy),
            resource_requirements: plan::resource_budget(capability, capacity_increase),
            timeline_secs: plan::timeline_secs(strategy, capacity_increase),
            cost_estimate: plan::cost_estimate(capability, capacity_increase),
            risk_assessment: plan::assess_risk(strategy, req.expansion_urgency),
            rollback_plan: plan::rollback_plan(strategy),
        }
    }

    /// Run the plan's steps in order. The first step that fails, times
    /// out, or is cancelled halts the plan.
    pub async fn execute_expansion_plan(
        &self,
        plan: &ExpansionPlan,
        ctx: &ExecutionContext,
    ) -> ExpansionRecord {
        let started_at = epoch_secs();
        let mut completed_steps = Vec::new();
        let mut failed_step = None;
        let mut failure = None;

        for step in &plan.implementation_steps {
            let subject = format!("{}: {}", plan.expansion_id, step);
            let fut = (self.step_fn)(plan.capability_type, step.clone());
            match ctx.run_one(&subject, fut).await {
                Ok(()) => {
                    debug!(expansion = %plan.expansion_id, step = %step, "expansion step completed");
                    completed_steps.push(StepRecord {
                        step: step.clone(),
                        completed_at: epoch_secs(),
                    });
                }
                Err(f) => {
                    warn!(expansion = %plan.expansion_id, error = %f, "expansion halted");
                    failed_step = Some(step.clone());
                    failure = Some(f);
                    break;
                }
            }
        }

        let status = match &failure {
            None => ExpansionStatus::Completed,
            Some(f) if f.is_cancelled() => ExpansionStatus::Cancelled,
            Some(_) => ExpansionStatus::Halted,
        };
        let actual_capacity_increase = if status == ExpansionStatus::Completed {
            plan.capacity_increase
        } else {
            0.0
        };
        info!(
            expansion = %plan.expansion_id,
            capability = %plan.capability_type,
            strategy = %plan.strategy,
            status = ?status,
            steps = completed_steps.len(),
            "capability expansion finished"
        );

        ExpansionRecord {
            expansion_id: plan.expansion_id.clone(),
            capability_type: plan.capability_type,
            strategy: plan.strategy,
            status,
            completed_steps,
            failed_step,
            failure,
            actual_capacity_increase,
            started_at,
            finished_at: epoch_secs(),
        }
    }
}

fn is_valid(req: &CapabilityRequirement) -> bool {
    let ok = req.required_capacity.is_finite()
        && req.current_capacity.is_finite()
        && req.required_capacity >= 0.0
        && req.current_capacity >= 0.0
        && req.expansion_urgency <= MAX_URGENCY;
    if !ok {
        warn!(
            capability = %req.capability_type,
            required = req.required_capacity,
            current = req.current_capacity,
            urgency = req.expansion_urgency,
            "skipping malformed capability requirement"
        );
    }
    ok
}
