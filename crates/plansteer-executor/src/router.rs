use tracing::{info, warn};

use plansteer_core::config::NodeCatalog;
use plansteer_core::error::PlanSteerError;
use plansteer_core::node::NextNode;
use plansteer_core::plan::Plan;

use crate::decision::Decision;

/// Picks the node for the step that is due, or reports the plan complete.
#[derive(Debug, Clone)]
pub struct StepRouter {
    nodes: NodeCatalog,
}

impl StepRouter {
    pub fn new(nodes: NodeCatalog) -> Self {
        Self { nodes }
    }

    /// Route `current_step` (1-based) of `plan`.
    ///
    /// The plan is expected to have passed validation. If it has not, an
    /// unknown tool comes back as [`Decision::Inconsistent`] rather than a
    /// validation failure.
    pub fn route(&self, plan: &Plan, current_step: usize, only_nl2sql: bool) -> Decision {
        let steps = plan.steps();

        info!(
            current_step,
            only_nl2sql,
            tools = ?plan.tool_names(),
            "Routing plan step"
        );

        if current_step > steps.len() {
            info!(current_step, total_steps = steps.len(), "Plan completed");
            return Decision::completed(only_nl2sql);
        }

        if current_step == 0 {
            return self.inconsistent(PlanSteerError::InvalidStepPointer(current_step));
        }

        let tool = steps[current_step - 1].tool_to_use.as_deref();
        info!(tool = tool.unwrap_or("null"), step = current_step, "Selecting tool");

        match tool.and_then(|t| self.dispatch_target(t)) {
            Some(node) => {
                info!(next_node = %self.nodes.id(node), "Determined next execution node");
                Decision::StepDispatched {
                    step: current_step,
                    node,
                }
            }
            None => self.inconsistent(PlanSteerError::UnsupportedNode(tool.map(String::from))),
        }
    }

    /// A step may hand off to a tool or pause for human feedback mid-plan.
    fn dispatch_target(&self, id: &str) -> Option<NextNode> {
        match self.nodes.resolve(id)? {
            NextNode::End => None,
            node => Some(node),
        }
    }

    fn inconsistent(&self, error: PlanSteerError) -> Decision {
        debug_assert!(error.is_routing_inconsistency());
        warn!(error = %error, "Plan routing inconsistency");
        Decision::Inconsistent {
            reason: error.to_string(),
        }
    }
}
