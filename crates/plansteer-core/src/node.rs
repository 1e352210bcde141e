/// A downstream node that can carry out a plan step.
///
/// Identifiers come from configuration; see
/// [`NodeCatalog::tool_id`](crate::config::NodeCatalog::tool_id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolNode {
    /// Turns a natural-language instruction into SQL and runs it.
    SqlGenerate,
    /// Generates and runs an analysis script.
    PythonGenerate,
    /// Writes the final report from accumulated step results.
    ReportGenerator,
}

impl ToolNode {
    pub const ALL: [ToolNode; 3] = [
        ToolNode::SqlGenerate,
        ToolNode::PythonGenerate,
        ToolNode::ReportGenerator,
    ];
}

/// The routing decision handed back to the workflow engine.
///
/// Engines see it as its configured identifier, rendered through
/// [`NodeCatalog::id`](crate::config::NodeCatalog::id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NextNode {
    Tool(ToolNode),
    HumanFeedback,
    End,
}

impl From<ToolNode> for NextNode {
    fn from(tool: ToolNode) -> Self {
        NextNode::Tool(tool)
    }
}
