use tracing::info;

use plansteer_core::state::WorkflowState;

use crate::decision::Decision;

/// Pauses a freshly validated plan for human approval.
///
/// Consulted once per invocation, after validation and before any step is
/// routed. It never looks at the step pointer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewGate;

impl ReviewGate {
    pub fn new() -> Self {
        Self
    }

    /// `Some` when the plan must wait for a reviewer, `None` to carry on routing.
    pub fn check(&self, state: &WorkflowState) -> Option<Decision> {
        if state.human_review_enabled {
            info!("Human review enabled, routing to human feedback");
            Some(Decision::AwaitingHumanReview)
        } else {
            None
        }
    }
}
