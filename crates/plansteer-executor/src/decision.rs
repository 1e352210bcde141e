use plansteer_core::error::PlanSteerError;
use plansteer_core::node::{NextNode, ToolNode};
use plansteer_core::state::StateUpdate;

/// Outcome of one plan-executor invocation.
///
/// Every variant is terminal for the invocation; the engine merges the
/// resulting [`StateUpdate`] and calls again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The plan is defective. The engine may re-plan.
    ValidationFailed { reason: String, repair_count: u32 },
    /// Human review is on: pause before any step runs.
    AwaitingHumanReview,
    /// Hand the current step to `node`.
    StepDispatched { step: usize, node: NextNode },
    /// Every step has run. The step pointer goes back to 1.
    Completed { next: NextNode },
    /// Routing hit a state validation should have ruled out.
    Inconsistent { reason: String },
}

impl Decision {
    /// Completion target: straight to the end for pure query plans, otherwise
    /// on to the report.
    pub fn completed(only_nl2sql: bool) -> Self {
        let next = if only_nl2sql {
            NextNode::End
        } else {
            NextNode::Tool(ToolNode::ReportGenerator)
        };
        Decision::Completed { next }
    }

    /// Classify an error. Plan defects bump `previous_repair_count`; anything
    /// else means the component's own invariants were broken.
    pub fn from_error(error: &PlanSteerError, previous_repair_count: u32) -> Self {
        let reason = error.to_string();
        if error.is_validation_failure() {
            Decision::ValidationFailed {
                reason,
                repair_count: previous_repair_count.saturating_add(1),
            }
        } else {
            Decision::Inconsistent { reason }
        }
    }

    /// Only validation failures count toward the repair budget.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Decision::ValidationFailed { .. })
    }

    pub fn is_success(&self) -> bool {
        !matches!(
            self,
            Decision::ValidationFailed { .. } | Decision::Inconsistent { .. }
        )
    }

    /// The node the engine should run next, if routing succeeded.
    pub fn next_node(&self) -> Option<NextNode> {
        match self {
            Decision::AwaitingHumanReview => Some(NextNode::HumanFeedback),
            Decision::StepDispatched { node, .. } => Some(*node),
            Decision::Completed { next } => Some(*next),
            Decision::ValidationFailed { .. } | Decision::Inconsistent { .. } => None,
        }
    }

    /// The partial state update the engine merges.
    pub fn to_update(&self) -> StateUpdate {
        let mut update = StateUpdate {
            validation_status: self.is_success(),
            validation_error: None,
            repair_count: None,
            current_step: None,
            next_node: self.next_node(),
        };
        match self {
            Decision::ValidationFailed {
                reason,
                repair_count,
            } => {
                update.validation_error = Some(reason.clone());
                update.repair_count = Some(*repair_count);
            }
            Decision::Inconsistent { reason } => {
                update.validation_error = Some(reason.clone());
            }
            Decision::Completed { .. } => {
                update.current_step = Some(1);
            }
            Decision::AwaitingHumanReview | Decision::StepDispatched { .. } => {}
        }
        update
    }
}
