use tracing::{debug, info};

use plansteer_core::config::NodeCatalog;
use plansteer_core::error::{PlanSteerError, Result};
use plansteer_core::plan::{Plan, PlanData};

/// Checks a plan's structure before any step is dispatched.
///
/// Only presence is checked for parameters; what they mean is up to the node
/// that runs the step.
#[derive(Debug, Clone)]
pub struct PlanValidator {
    nodes: NodeCatalog,
}

impl PlanValidator {
    pub fn new(nodes: NodeCatalog) -> Self {
        Self { nodes }
    }

    /// Parse and check the plan, returning it when well-formed.
    ///
    /// Steps are checked in order and the first defect wins. Within a step the
    /// tool is checked before the parameters.
    pub fn validate(&self, plan: Option<&PlanData>) -> Result<Plan> {
        let plan = plan.ok_or(PlanSteerError::PlanMissing)?.parse()?;

        let steps = match plan.execution_plan.as_deref() {
            Some(steps) if !steps.is_empty() => steps,
            _ => return Err(PlanSteerError::EmptyPlan),
        };

        for (index, step) in steps.iter().enumerate() {
            let ordinal = step.ordinal(index);
            let tool = step.tool_to_use.as_deref();
            if tool.and_then(|t| self.nodes.tool(t)).is_none() {
                return Err(PlanSteerError::InvalidTool {
                    tool: step.tool_to_use.clone(),
                    step: ordinal,
                });
            }
            if step.tool_parameters.is_none() {
                return Err(PlanSteerError::MissingParameters { step: ordinal });
            }
            debug!(step = ordinal, tool = tool.unwrap_or_default(), "Step passed validation");
        }

        info!(steps = steps.len(), "Plan validation successful");
        Ok(plan)
    }
}
