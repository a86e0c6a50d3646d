//! A flow groups tasks and supplies a default agent for them.

use serde_json::{Map, Value};

use super::agent::Agent;
use super::tool::Tool;

#[derive(Debug, Clone, Default)]
pub struct Flow {
    pub name: Option<String>,
    pub default_agent: Option<Agent>,
    /// Tools available to every agent in the flow
    pub tools: Vec<Tool>,
    pub context: Map<String, Value>,
}

impl Flow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_default_agent(mut self, agent: Agent) -> Self {
        self.default_agent = Some(agent);
        self
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }
}
