use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlanSteerError, Result};
use crate::node::{NextNode, ToolNode};

/// Top-level plansteer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub nodes: NodeCatalog,
    #[serde(default)]
    pub log: LogConfig,
}

/// Identifiers the workflow engine uses for each downstream node.
///
/// Plans name their tools with these strings, and routing decisions are
/// rendered back through them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCatalog {
    #[serde(default = "default_sql_generate")]
    pub sql_generate: String,
    #[serde(default = "default_python_generate")]
    pub python_generate: String,
    #[serde(default = "default_report_generator")]
    pub report_generator: String,
    #[serde(default = "default_human_feedback")]
    pub human_feedback: String,
    #[serde(default = "default_end")]
    pub end: String,
}

impl Default for NodeCatalog {
    fn default() -> Self {
        Self {
            sql_generate: default_sql_generate(),
            python_generate: default_python_generate(),
            report_generator: default_report_generator(),
            human_feedback: default_human_feedback(),
            end: default_end(),
        }
    }
}

fn default_sql_generate() -> String { "sql_generate".to_string() }
fn default_python_generate() -> String { "python_generate".to_string() }
fn default_report_generator() -> String { "report_generator".to_string() }
fn default_human_feedback() -> String { "human_feedback".to_string() }
fn default_end() -> String { "end".to_string() }

impl NodeCatalog {
    /// The configured identifier for a node.
    pub fn id(&self, node: NextNode) -> &str {
        match node {
            NextNode::Tool(tool) => self.tool_id(tool),
            NextNode::HumanFeedback => &self.human_feedback,
            NextNode::End => &self.end,
        }
    }

    /// The configured identifier for a tool node.
    pub fn tool_id(&self, tool: ToolNode) -> &str {
        match tool {
            ToolNode::SqlGenerate => &self.sql_generate,
            ToolNode::PythonGenerate => &self.python_generate,
            ToolNode::ReportGenerator => &self.report_generator,
        }
    }

    /// Look up a supported tool by identifier. Human feedback and the end
    /// sentinel are not tools.
    pub fn tool(&self, id: &str) -> Option<ToolNode> {
        ToolNode::ALL.into_iter().find(|t| self.tool_id(*t) == id)
    }

    /// Look up any routable node by identifier.
    pub fn resolve(&self, id: &str) -> Option<NextNode> {
        if let Some(tool) = self.tool(id) {
            return Some(NextNode::Tool(tool));
        }
        if id == self.human_feedback {
            return Some(NextNode::HumanFeedback);
        }
        if id == self.end {
            return Some(NextNode::End);
        }
        None
    }

    /// Identifiers a plan step may name.
    pub fn supported_tools(&self) -> Vec<&str> {
        ToolNode::ALL.iter().map(|t| self.tool_id(*t)).collect()
    }

    /// Every identifier must be non-empty and distinct from the others.
    pub fn validate(&self) -> Result<()> {
        let entries = [
            ("sql_generate", &self.sql_generate),
            ("python_generate", &self.python_generate),
            ("report_generator", &self.report_generator),
            ("human_feedback", &self.human_feedback),
            ("end", &self.end),
        ];
        let mut seen = HashSet::new();
        for (key, id) in entries {
            if id.trim().is_empty() {
                return Err(PlanSteerError::Config(format!(
                    "nodes.{} must not be empty",
                    key
                )));
            }
            if !seen.insert(id.as_str()) {
                return Err(PlanSteerError::Config(format!(
                    "nodes.{} reuses identifier '{}'",
                    key, id
                )));
            }
        }
        Ok(())
    }
}

/// Log output configuration. `RUST_LOG` takes precedence when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String { "plansteer=info,warn".to_string() }

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| PlanSteerError::ConfigNotFound(path.display().to_string()))?;

        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Parse and validate config text, expanding `${ENV_VAR}` references first.
    pub fn from_toml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content);
        let config: Self =
            toml::from_str(&expanded).map_err(|e| PlanSteerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.nodes.validate()
    }
}

/// Substitute `${NAME}` with the value of environment variable `NAME`.
///
/// Unset variables and an unterminated `${` are left in the text as written.
fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(len) = after.find('}') else {
            rest = &rest[start..];
            break;
        };
        let name = &after[..len];
        match std::env::var(name) {
            Ok(value) => out.push_str(&value),
            Err(_) => out.push_str(&rest[start..start + len + 3]),
        }
        rest = &after[len + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_identifier_from_env() {
        std::env::set_var("PLANSTEER_CFG_REPORT_NODE", "REPORT_GENERATOR_NODE");
        let config = AppConfig::from_toml(
            "[nodes]\nreport_generator = \"${PLANSTEER_CFG_REPORT_NODE}\"\n",
        )
        .unwrap();
        std::env::remove_var("PLANSTEER_CFG_REPORT_NODE");

        assert_eq!(config.nodes.report_generator, "REPORT_GENERATOR_NODE");
        assert_eq!(
            config.nodes.tool("REPORT_GENERATOR_NODE"),
            Some(ToolNode::ReportGenerator)
        );
    }

    #[test]
    fn test_unset_variable_kept_as_identifier() {
        let config = AppConfig::from_toml(
            "[nodes]\nend = \"${PLANSTEER_CFG_UNSET_END}\"\n",
        )
        .unwrap();
        assert_eq!(config.nodes.end, "${PLANSTEER_CFG_UNSET_END}");
        assert_eq!(
            config.nodes.resolve("${PLANSTEER_CFG_UNSET_END}"),
            Some(NextNode::End)
        );
    }

    #[test]
    fn test_expansion_mixed_with_literal_text() {
        std::env::set_var("PLANSTEER_CFG_PREFIX", "nl2");
        let expanded = expand_env_vars("sql_generate = \"${PLANSTEER_CFG_PREFIX}sql\" # ${");
        std::env::remove_var("PLANSTEER_CFG_PREFIX");
        assert_eq!(expanded, "sql_generate = \"nl2sql\" # ${");
    }

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.nodes, NodeCatalog::default());
        assert_eq!(config.nodes.sql_generate, "sql_generate");
        assert_eq!(config.nodes.end, "end");
        assert_eq!(config.log.filter, "plansteer=info,warn");
    }

    #[test]
    fn test_partial_nodes_table() {
        let config = AppConfig::from_toml(
            r#"
[nodes]
sql_generate = "SQL_GENERATE_NODE"
human_feedback = "HUMAN_FEEDBACK_NODE"
"#,
        )
        .unwrap();
        assert_eq!(config.nodes.sql_generate, "SQL_GENERATE_NODE");
        assert_eq!(config.nodes.python_generate, "python_generate");
        assert_eq!(config.nodes.tool("SQL_GENERATE_NODE"), Some(ToolNode::SqlGenerate));
        assert_eq!(config.nodes.tool("sql_generate"), None);
    }

    #[test]
    fn test_resolve() {
        let nodes = NodeCatalog::default();
        assert_eq!(
            nodes.resolve("python_generate"),
            Some(NextNode::Tool(ToolNode::PythonGenerate))
        );
        assert_eq!(nodes.resolve("human_feedback"), Some(NextNode::HumanFeedback));
        assert_eq!(nodes.resolve("end"), Some(NextNode::End));
        assert_eq!(nodes.resolve("shell_exec"), None);

        // Human feedback routes, but is not a tool a plan may name.
        assert_eq!(nodes.tool("human_feedback"), None);
        assert_eq!(
            nodes.supported_tools(),
            vec!["sql_generate", "python_generate", "report_generator"]
        );
    }

    #[test]
    fn test_id_round_trips_through_resolve() {
        let nodes = NodeCatalog::default();
        for node in [
            NextNode::Tool(ToolNode::SqlGenerate),
            NextNode::Tool(ToolNode::ReportGenerator),
            NextNode::HumanFeedback,
            NextNode::End,
        ] {
            assert_eq!(nodes.resolve(nodes.id(node)), Some(node));
        }
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let err = AppConfig::from_toml(
            r#"
[nodes]
report_generator = "sql_generate"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, PlanSteerError::Config(_)));
        assert!(err.to_string().contains("nodes.report_generator"));
    }

    #[test]
    fn test_empty_identifier_rejected() {
        let err = AppConfig::from_toml("[nodes]\nend = \"  \"\n").unwrap_err();
        assert!(err.to_string().contains("nodes.end must not be empty"));
    }

    #[test]
    fn test_malformed_toml() {
        let err = AppConfig::from_toml("[nodes\n").unwrap_err();
        assert!(matches!(err, PlanSteerError::Config(_)));
    }
}
