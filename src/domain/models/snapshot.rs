//! Prompt-safe view of a task.
//!
//! Snapshots carry ids instead of object references so they can be
//! serialized into prompts, logs and status displays.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::agent::AgentSummary;
use super::task::TaskStatus;
use super::tool::ToolSummary;

/// Declared result type with its schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTypeSummary {
    #[serde(rename = "type")]
    pub kind: String,
    pub schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: String,
    pub name: Option<String>,
    pub objective: String,
    pub instructions: Option<String>,
    pub status: TaskStatus,
    pub context: Map<String, Value>,
    pub result: Option<Value>,
    pub result_type: Option<ResultTypeSummary>,
    pub parent: Option<String>,
    pub depends_on: Vec<String>,
    pub subtasks: Vec<String>,
    pub agents: Vec<AgentSummary>,
    pub completion_agents: Option<Vec<AgentSummary>>,
    pub tools: Vec<ToolSummary>,
    pub interactive: bool,
    pub llm_calls: u32,
    pub max_llm_calls: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl TaskSnapshot {
    /// Compact JSON for embedding in prompts.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
