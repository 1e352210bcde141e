use tracing::warn;

use plansteer_core::config::{AppConfig, NodeCatalog};
use plansteer_core::state::{StateUpdate, WorkflowState};

use crate::decision::Decision;
use crate::review::ReviewGate;
use crate::router::StepRouter;
use crate::validator::PlanValidator;

/// The plan executor node: validate, gate, then route.
///
/// Holds only its node catalog, so one instance can serve any number of
/// workflows. Each call is a pure function of the state snapshot it is given.
#[derive(Debug, Clone)]
pub struct PlanExecutor {
    nodes: NodeCatalog,
    validator: PlanValidator,
    gate: ReviewGate,
    router: StepRouter,
}

impl PlanExecutor {
    pub fn new(nodes: NodeCatalog) -> Self {
        Self {
            validator: PlanValidator::new(nodes.clone()),
            gate: ReviewGate::new(),
            router: StepRouter::new(nodes.clone()),
            nodes,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.nodes.clone())
    }

    pub fn nodes(&self) -> &NodeCatalog {
        &self.nodes
    }

    /// Decide what happens next for this snapshot.
    pub fn decide(&self, state: &WorkflowState) -> Decision {
        let plan = match self.validator.validate(state.plan.as_ref()) {
            Ok(plan) => plan,
            Err(e) => {
                let decision = Decision::from_error(&e, state.repair_count);
                if decision.is_recoverable() {
                    warn!(error = %e, repair_count = state.repair_count.saturating_add(1), "Plan validation failed");
                } else {
                    warn!(error = %e, "Plan validator returned a non-validation error");
                }
                return decision;
            }
        };

        if let Some(decision) = self.gate.check(state) {
            return decision;
        }

        self.router
            .route(&plan, state.current_step, state.only_nl2sql)
    }

    /// Decide and render the partial update for the engine to merge.
    pub fn apply(&self, state: &WorkflowState) -> StateUpdate {
        self.decide(state).to_update()
    }
}

impl Default for PlanExecutor {
    fn default() -> Self {
        Self::new(NodeCatalog::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plansteer_core::node::{NextNode, ToolNode};
    use plansteer_core::plan::{ExecutionStep, Plan};
    use serde_json::json;

    fn sql_then_python() -> Plan {
        Plan::new(vec![
            ExecutionStep::new(1, "sql_generate").with_parameters(json!({"instruction": "q"})),
            ExecutionStep::new(2, "python_generate"),
        ])
    }

    #[test]
    fn test_single_sql_step() {
        let plan = Plan::new(vec![ExecutionStep::new(1, "sql_generate")]);
        let state = WorkflowState::new().with_plan(&plan);
        let update = PlanExecutor::default().apply(&state);
        assert!(update.validation_status);
        assert_eq!(update.next_node, Some(NextNode::Tool(ToolNode::SqlGenerate)));
        assert_eq!(update.current_step, None);
        assert_eq!(update.repair_count, None);
    }

    #[test]
    fn test_empty_plan_increments_repair_count() {
        let state = WorkflowState::new().with_plan(&Plan::new(vec![]));
        let update = PlanExecutor::default().apply(&state);
        assert!(!update.validation_status);
        assert_eq!(update.repair_count, Some(1));
        assert!(update.validation_error.unwrap().contains("empty"));
        assert_eq!(update.next_node, None);
    }

    #[test]
    fn test_repair_count_builds_on_previous() {
        let state = WorkflowState::new()
            .with_plan_text("```json\n{oops}\n```")
            .with_repair_count(2)
            .with_current_step(2);
        let update = PlanExecutor::default().apply(&state);
        assert!(!update.validation_status);
        assert_eq!(update.repair_count, Some(3));
        assert_eq!(update.current_step, None);
        assert!(update
            .validation_error
            .unwrap()
            .contains("not a valid JSON structure"));
    }

    #[test]
    fn test_missing_plan_fails_validation() {
        let decision = PlanExecutor::default().decide(&WorkflowState::default());
        assert!(decision.is_recoverable());
        assert_eq!(decision.to_update().repair_count, Some(1));
    }

    #[test]
    fn test_human_review_preempts_routing() {
        for step in [1, 2, 3, 99] {
            let state = WorkflowState::new()
                .with_plan(&sql_then_python())
                .with_human_review(true)
                .with_current_step(step);
            assert_eq!(
                PlanExecutor::default().decide(&state),
                Decision::AwaitingHumanReview
            );
        }
    }

    #[test]
    fn test_human_review_does_not_mask_invalid_plan() {
        let state = WorkflowState::new()
            .with_plan(&Plan::new(vec![]))
            .with_human_review(true);
        assert!(matches!(
            PlanExecutor::default().decide(&state),
            Decision::ValidationFailed { repair_count: 1, .. }
        ));
    }

    #[test]
    fn test_completion_only_nl2sql() {
        let state = WorkflowState::new()
            .with_plan(&sql_then_python())
            .with_current_step(3)
            .with_only_nl2sql(true);
        let update = PlanExecutor::default().apply(&state);
        assert!(update.validation_status);
        assert_eq!(update.current_step, Some(1));
        assert_eq!(update.next_node, Some(NextNode::End));
        assert_eq!(
            update.to_entries(&NodeCatalog::default())["plan_next_node"],
            json!("end")
        );
    }

    #[test]
    fn test_completion_goes_to_report() {
        let state = WorkflowState::new()
            .with_plan(&sql_then_python())
            .with_current_step(3);
        let update = PlanExecutor::default().apply(&state);
        assert_eq!(update.current_step, Some(1));
        assert_eq!(
            update.next_node,
            Some(NextNode::Tool(ToolNode::ReportGenerator))
        );
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let executor = PlanExecutor::default();
        let state = WorkflowState::new()
            .with_plan(&sql_then_python())
            .with_current_step(2)
            .with_repair_count(1);
        let first = executor.apply(&state);
        let second = executor.apply(&state);
        assert_eq!(first, second);
        assert!(first.validation_status);
        assert_eq!(first.repair_count, None);
    }

    #[test]
    fn test_configured_identifiers() {
        let config = AppConfig::from_toml(
            r#"
[nodes]
sql_generate = "SQL_GENERATE_NODE"
end = "__END__"
"#,
        )
        .unwrap();
        let executor = PlanExecutor::from_config(&config);
        let plan = Plan::new(vec![ExecutionStep::new(1, "SQL_GENERATE_NODE")]);

        let update = executor.apply(&WorkflowState::new().with_plan(&plan));
        assert_eq!(
            update.to_entries(executor.nodes())["plan_next_node"],
            json!("SQL_GENERATE_NODE")
        );

        let update = executor.apply(
            &WorkflowState::new()
                .with_plan(&plan)
                .with_current_step(2)
                .with_only_nl2sql(true),
        );
        assert_eq!(
            update.to_entries(executor.nodes())["plan_next_node"],
            json!("__END__")
        );
    }

    #[test]
    fn test_executor_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PlanExecutor>();
    }
}
