use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanSteerError {
    // Plan validation errors
    #[error("Validation failed: No plan is available in the workflow state.")]
    PlanMissing,

    #[error("Validation failed: The generated plan is empty or has no execution steps.")]
    EmptyPlan,

    #[error(
        "Validation failed: Plan contains an invalid tool name: '{}' in step {}",
        .tool.as_deref().unwrap_or("null"),
        .step
    )]
    InvalidTool { tool: Option<String>, step: i64 },

    #[error("Validation failed: Tool parameters are missing for step {step}")]
    MissingParameters { step: i64 },

    #[error("Validation failed: The plan is not a valid JSON structure. Error: {0}")]
    PlanParse(String),

    // Routing errors
    #[error("Unsupported node type: {}", .0.as_deref().unwrap_or("null"))]
    UnsupportedNode(Option<String>),

    #[error("Invalid step pointer: {0} (steps are numbered from 1)")]
    InvalidStepPointer(usize),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlanSteerError {
    /// A defect in the plan itself. The engine may re-plan and try again.
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            Self::PlanMissing
                | Self::EmptyPlan
                | Self::InvalidTool { .. }
                | Self::MissingParameters { .. }
                | Self::PlanParse(_)
        )
    }

    /// Routing reached a state that validation should have ruled out.
    pub fn is_routing_inconsistency(&self) -> bool {
        matches!(self, Self::UnsupportedNode(_) | Self::InvalidStepPointer(_))
    }
}

pub type Result<T> = std::result::Result<T, PlanSteerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_tool_message_names_tool_and_step() {
        let err = PlanSteerError::InvalidTool {
            tool: Some("shell_exec".into()),
            step: 2,
        };
        assert_eq!(
            err.to_string(),
            "Validation failed: Plan contains an invalid tool name: 'shell_exec' in step 2"
        );
    }

    #[test]
    fn test_absent_tool_renders_as_null() {
        let err = PlanSteerError::InvalidTool { tool: None, step: 1 };
        assert!(err.to_string().contains("'null' in step 1"));

        let err = PlanSteerError::MissingParameters { step: -1 };
        assert!(err.to_string().ends_with("for step -1"));

        let err = PlanSteerError::UnsupportedNode(None);
        assert_eq!(err.to_string(), "Unsupported node type: null");
    }

    #[test]
    fn test_error_kinds() {
        assert!(PlanSteerError::EmptyPlan.is_validation_failure());
        assert!(PlanSteerError::PlanParse("eof".into()).is_validation_failure());
        assert!(!PlanSteerError::EmptyPlan.is_routing_inconsistency());

        let err = PlanSteerError::UnsupportedNode(Some("x".into()));
        assert!(err.is_routing_inconsistency());
        assert!(!err.is_validation_failure());

        assert!(!PlanSteerError::Config("bad".into()).is_validation_failure());
        assert!(!PlanSteerError::Config("bad".into()).is_routing_inconsistency());
    }
}
