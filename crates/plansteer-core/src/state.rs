use serde::{Deserialize, Serialize};

use crate::config::NodeCatalog;
use crate::node::NextNode;
use crate::plan::{Plan, PlanData};

/// Keys shared by [`WorkflowState`] snapshots and rendered [`StateUpdate`]s.
pub mod keys {
    pub const VALIDATION_STATUS: &str = "plan_validation_status";
    pub const VALIDATION_ERROR: &str = "plan_validation_error";
    pub const REPAIR_COUNT: &str = "plan_repair_count";
    pub const CURRENT_STEP: &str = "plan_current_step";
    pub const NEXT_NODE: &str = "plan_next_node";
}

/// Snapshot of the workflow state this component reads.
///
/// The outer engine owns the authoritative copy. Every field has a default so a
/// partial JSON snapshot deserializes cleanly, and the routing fields use the
/// same keys as [`StateUpdate::to_entries`], so merged output reads back in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// The current plan, unparsed.
    #[serde(default)]
    pub plan: Option<PlanData>,
    /// Pause for human approval before any step runs.
    #[serde(default)]
    pub human_review_enabled: bool,
    /// The request only needs SQL; skip the report at the end.
    #[serde(default)]
    pub only_nl2sql: bool,
    /// 1-based number of the step due next.
    #[serde(
        rename = "plan_current_step",
        alias = "current_step",
        default = "default_current_step"
    )]
    pub current_step: usize,
    /// Consecutive plan validation failures.
    #[serde(rename = "plan_repair_count", alias = "repair_count", default)]
    pub repair_count: u32,
    #[serde(
        rename = "plan_validation_status",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub validation_status: Option<bool>,
    #[serde(
        rename = "plan_validation_error",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub validation_error: Option<String>,
    /// Configured identifier of the node chosen last; see [`WorkflowState::next_node`].
    #[serde(
        rename = "plan_next_node",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_node: Option<String>,
}

fn default_current_step() -> usize {
    1
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            plan: None,
            human_review_enabled: false,
            only_nl2sql: false,
            current_step: default_current_step(),
            repair_count: 0,
            validation_status: None,
            validation_error: None,
            next_node: None,
        }
    }
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the plan from a structured value.
    pub fn with_plan(mut self, plan: &Plan) -> Self {
        self.plan = Some(PlanData::from(plan));
        self
    }

    /// Set the plan from raw planner output.
    pub fn with_plan_text(mut self, text: impl Into<String>) -> Self {
        self.plan = Some(PlanData::Text(text.into()));
        self
    }

    pub fn with_current_step(mut self, step: usize) -> Self {
        self.current_step = step;
        self
    }

    pub fn with_repair_count(mut self, count: u32) -> Self {
        self.repair_count = count;
        self
    }

    pub fn with_human_review(mut self, enabled: bool) -> Self {
        self.human_review_enabled = enabled;
        self
    }

    pub fn with_only_nl2sql(mut self, only: bool) -> Self {
        self.only_nl2sql = only;
        self
    }

    /// The last routed node, resolved through the configured identifiers.
    pub fn next_node(&self, nodes: &NodeCatalog) -> Option<NextNode> {
        self.next_node.as_deref().and_then(|id| nodes.resolve(id))
    }

    /// Merge an update into this state. Present fields overwrite, absent
    /// fields are left as they were.
    pub fn apply(&mut self, update: &StateUpdate, nodes: &NodeCatalog) {
        self.validation_status = Some(update.validation_status);
        if let Some(ref error) = update.validation_error {
            self.validation_error = Some(error.clone());
        }
        if let Some(count) = update.repair_count {
            self.repair_count = count;
        }
        if let Some(step) = update.current_step {
            self.current_step = step;
        }
        if let Some(node) = update.next_node {
            self.next_node = Some(nodes.id(node).to_string());
        }
    }
}

/// Partial state update returned by one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateUpdate {
    pub validation_status: bool,
    /// Present only when `validation_status` is false.
    pub validation_error: Option<String>,
    /// Present only on validation failure.
    pub repair_count: Option<u32>,
    /// Present only when the plan has completed.
    pub current_step: Option<usize>,
    /// Present whenever routing succeeded.
    pub next_node: Option<NextNode>,
}

impl StateUpdate {
    /// Render as flat key→value entries, next node as its configured identifier.
    pub fn to_entries(&self, nodes: &NodeCatalog) -> serde_json::Map<String, serde_json::Value> {
        let mut entries = serde_json::Map::new();
        entries.insert(
            keys::VALIDATION_STATUS.to_string(),
            serde_json::Value::Bool(self.validation_status),
        );
        if let Some(ref error) = self.validation_error {
            entries.insert(keys::VALIDATION_ERROR.to_string(), error.clone().into());
        }
        if let Some(count) = self.repair_count {
            entries.insert(keys::REPAIR_COUNT.to_string(), count.into());
        }
        if let Some(step) = self.current_step {
            entries.insert(keys::CURRENT_STEP.to_string(), step.into());
        }
        if let Some(node) = self.next_node {
            entries.insert(keys::NEXT_NODE.to_string(), nodes.id(node).into());
        }
        entries
    }
}
