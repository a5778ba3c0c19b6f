//! Agent definitions, tools, and stage execution.
//!
//! An [`AgentSpec`] describes one stage (model, instructions, tool list);
//! a [`StageRunner`] executes it against an input string. The
//! OpenAI-backed runner drives a tool-calling loop, dispatching tool calls
//! to a [`Toolbox`].

mod runner;
mod tools;

pub use runner::{OpenAIRunner, RunResult, StageOutput, StageRunner, ToolCallRecord};
pub use tools::{parse_tool_call, tool_definitions, SearchTool, ToolCall, Toolbox};

use serde::{Deserialize, Serialize};

/// Default cap on LLM round-trips per stage.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Tools an agent may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Web search via [`SearchTool`].
    InternetSearch,
}

impl ToolKind {
    /// Function name exposed to the model.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::InternetSearch => SearchTool::NAME,
        }
    }
}

/// Definition of a single pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Display name, e.g. "Planner Agent".
    pub name: String,
    /// Model identifier.
    pub model: String,
    /// System instructions.
    pub instructions: String,
    /// Tools the agent may call.
    #[serde(default)]
    pub tools: Vec<ToolKind>,
    /// Maximum LLM round-trips before the stage fails.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

impl AgentSpec {
    /// Create an agent with no tools.
    pub fn new(name: &str, model: &str, instructions: &str) -> Self {
        Self {
            name: name.to_string(),
            model: model.to_string(),
            instructions: instructions.trim().to_string(),
            tools: Vec::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Grant a tool.
    pub fn with_tool(mut self, tool: ToolKind) -> Self {
        if !self.tools.contains(&tool) {
            self.tools.push(tool);
        }
        self
    }

    /// Revoke every tool.
    pub fn without_tools(mut self) -> Self {
        self.tools.clear();
        self
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Whether the agent may call `tool`.
    pub fn allows(&self, tool: ToolKind) -> bool {
        self.tools.contains(&tool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_spec_tools() {
        let agent = AgentSpec::new("Reviewer Agent", "gpt-4o", "  review  \n")
            .with_tool(ToolKind::InternetSearch)
            .with_tool(ToolKind::InternetSearch);
        assert_eq!(agent.instructions, "review");
        assert_eq!(agent.tools, vec![ToolKind::InternetSearch]);
        assert!(agent.allows(ToolKind::InternetSearch));

        let agent = agent.without_tools();
        assert!(!agent.allows(ToolKind::InternetSearch));
    }

    #[test]
    fn test_tool_kind_name() {
        assert_eq!(ToolKind::InternetSearch.name(), "internet_search");
    }
}
