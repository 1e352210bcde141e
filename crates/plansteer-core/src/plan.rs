use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{PlanSteerError, Result};

/// An execution plan produced by the upstream planner.
///
/// Fields are optional on the wire so that a structurally incomplete plan still
/// parses and can be rejected with a precise validation message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// The planner's reasoning. Carried along, never inspected.
    #[serde(default, alias = "thoughtProcess", skip_serializing_if = "Option::is_none")]
    pub thought_process: Option<String>,
    /// Steps in execution order.
    #[serde(default, alias = "executionPlan")]
    pub execution_plan: Option<Vec<ExecutionStep>>,
}

/// One unit of work in a plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// 1-based ordinal as written by the planner. Accepts integral floats and
    /// numeric strings; fractions are truncated.
    #[serde(default, deserialize_with = "lenient_ordinal")]
    pub step: Option<i64>,
    /// Identifier of the node that handles this step.
    #[serde(default, alias = "toolToUse")]
    pub tool_to_use: Option<String>,
    /// Parameters for the handling node. Present but possibly empty on a valid step.
    #[serde(default, alias = "toolParameters")]
    pub tool_parameters: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Plan {
    /// Build a plan from steps.
    pub fn new(steps: Vec<ExecutionStep>) -> Self {
        Self {
            thought_process: None,
            execution_plan: Some(steps),
        }
    }

    /// The steps, or an empty slice when the plan has none.
    pub fn steps(&self) -> &[ExecutionStep] {
        self.execution_plan.as_deref().unwrap_or_default()
    }

    /// Tool identifiers in step order, for logging.
    pub fn tool_names(&self) -> Vec<&str> {
        self.steps()
            .iter()
            .map(|s| s.tool_to_use.as_deref().unwrap_or("null"))
            .collect()
    }
}

impl ExecutionStep {
    /// Create a step with empty parameters.
    pub fn new(step: u32, tool: impl Into<String>) -> Self {
        Self {
            step: Some(i64::from(step)),
            tool_to_use: Some(tool.into()),
            tool_parameters: Some(serde_json::Map::new()),
        }
    }

    /// Set the parameters.
    pub fn with_parameters(mut self, params: serde_json::Value) -> Self {
        self.tool_parameters = match params {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        };
        self
    }

    /// Drop the parameters entirely.
    pub fn without_parameters(mut self) -> Self {
        self.tool_parameters = None;
        self
    }

    /// The declared ordinal, falling back to the step's position in the plan.
    pub fn ordinal(&self, index: usize) -> i64 {
        self.step.unwrap_or(index as i64 + 1)
    }
}

/// Read a step ordinal the way planners actually write it: `1`, `1.0`, `"1"`.
fn lenient_ordinal<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let ordinal = match raw {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };
    ordinal
        .map(Some)
        .ok_or_else(|| D::Error::custom("step must be an integer"))
}

/// A plan as it sits in workflow state: opaque until parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanData {
    /// Raw planner output, possibly wrapped in a Markdown code fence.
    Text(String),
    /// A plan already held as a JSON value.
    Structured(serde_json::Value),
}

impl PlanData {
    /// Parse into a [`Plan`]. Any failure becomes [`PlanSteerError::PlanParse`].
    pub fn parse(&self) -> Result<Plan> {
        let parsed = match self {
            PlanData::Text(text) => serde_json::from_str(strip_code_fence(text)),
            PlanData::Structured(value) => Plan::deserialize(value),
        };
        parsed.map_err(|e| PlanSteerError::PlanParse(e.to_string()))
    }
}

impl From<&Plan> for PlanData {
    fn from(plan: &Plan) -> Self {
        PlanData::Structured(serde_json::to_value(plan).unwrap_or_default())
    }
}

impl From<String> for PlanData {
    fn from(text: String) -> Self {
        PlanData::Text(text)
    }
}

/// Extract the body of the first Markdown code fence, if there is one.
///
/// The info string (e.g. `json`) on the opening fence is dropped. An unclosed
/// fence runs to the end of the input.
pub fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text.trim();
    };
    let after_open = &text[open + 3..];
    let body = match after_open.find('\n') {
        Some(nl) => &after_open[nl + 1..],
        None => return text.trim(),
    };
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}
