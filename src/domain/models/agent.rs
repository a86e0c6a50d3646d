use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::tool::{human_input, Tool, ToolSummary};
use crate::domain::fingerprint::fingerprint;

/// Instructions given to agents that do not bring their own.
pub const DEFAULT_AGENT_INSTRUCTIONS: &str =
    "You are a diligent AI assistant. You complete your tasks efficiently and without error.";

/// An autonomous worker that may be assigned tasks.
///
/// Equality and hashing use the fingerprint id, so clones of one agent
/// compare equal.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Fingerprint of name, description and instructions
    pub id: String,
    pub name: String,
    /// Visible to other agents
    pub description: Option<String>,
    /// Private to this agent
    pub instructions: Option<String>,
    pub tools: Vec<Tool>,
    /// Gives the agent the human input tool
    pub interactive: bool,
}

impl Agent {
    pub fn new(name: impl Into<String>) -> Self {
        let mut agent = Self {
            id: String::new(),
            name: name.into(),
            description: None,
            instructions: Some(DEFAULT_AGENT_INSTRUCTIONS.to_string()),
            tools: Vec::new(),
            interactive: false,
        };
        agent.refresh_id();
        agent
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self.refresh_id();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self.refresh_id();
        self
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    fn refresh_id(&mut self) {
        self.id = fingerprint(&(
            "Agent",
            &self.name,
            &self.description,
            &self.instructions,
        ));
    }

    /// Tools this agent carries, plus human input when interactive.
    pub fn get_tools(&self) -> Vec<Tool> {
        let mut tools = self.tools.clone();
        if self.interactive {
            tools.push(human_input());
        }
        tools
    }

    pub fn serialize_for_prompt(&self) -> AgentSummary {
        AgentSummary {
            name: self.name.clone(),
            id: self.id.clone(),
            description: self.description.clone(),
            tools: self.tools.iter().map(Tool::summary).collect(),
            interactive: self.interactive.then_some(true),
        }
    }
}

impl PartialEq for Agent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Agent {}

impl Hash for Agent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Prompt-safe description of an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub name: String,
    pub id: String,
    pub description: Option<String>,
    pub tools: Vec<ToolSummary>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub interactive: Option<bool>,
}
