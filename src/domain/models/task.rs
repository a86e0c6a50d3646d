//! Task domain model.
//!
//! Tasks are units of delegated work. They form a graph through parent /
//! subtask ownership and explicit dependency edges, both held by
//! [`TaskGraph`](crate::services::TaskGraph). A task is described by a
//! [`TaskDefinition`] and becomes a [`Task`] record once inserted.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::agent::Agent;
use super::result_type::{ResultType, ResultValidator};
use super::tool::{human_input, Tool};
use crate::domain::errors::{DomainResult, TaskError, ValidationError};
use crate::domain::fingerprint::fingerprint;

/// Objectives longer than this are truncated in friendly names.
const FRIENDLY_NAME_MAX_CHARS: usize = 50;

/// Handle of a task inside a [`TaskGraph`](crate::services::TaskGraph).
///
/// This is the identity used by graph edges. Two tasks with identical
/// fingerprints are still two distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskKey(pub(crate) usize);

impl TaskKey {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Successful,
    Failed,
    Skipped,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Successful => "SUCCESSFUL",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "successful" | "success" => Some(Self::Successful),
            "failed" => Some(Self::Failed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    /// Successful, failed and skipped tasks are complete.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Successful | Self::Failed | Self::Skipped)
    }

    pub fn is_incomplete(&self) -> bool {
        !self.is_complete()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a new task's parent comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parent {
    /// The innermost task active in the execution context, if any.
    #[default]
    FromContext,
    /// No parent.
    Root,
    /// An explicit parent.
    Of(TaskKey),
}

/// Everything needed to create a task.
#[derive(Debug, Clone)]
pub struct TaskDefinition {
    pub objective: String,
    pub instructions: Option<String>,
    pub name: Option<String>,
    /// Overrides the default prompt template
    pub prompt: Option<String>,
    pub context: Map<String, Value>,
    pub agents: Option<Vec<Agent>>,
    pub completion_agents: Option<Vec<Agent>>,
    pub parent: Parent,
    pub depends_on: Vec<TaskKey>,
    pub result_type: ResultType,
    pub result_validator: Option<ResultValidator>,
    pub tools: Vec<Tool>,
    pub interactive: bool,
    /// Falls back to the configured default when unset
    pub max_llm_calls: Option<u32>,
}

impl TaskDefinition {
    pub fn new(objective: impl Into<String>) -> Self {
        Self {
            objective: objective.into(),
            instructions: None,
            name: None,
            prompt: None,
            context: Map::new(),
            agents: None,
            completion_agents: None,
            parent: Parent::default(),
            depends_on: Vec::new(),
            result_type: ResultType::default(),
            result_validator: None,
            tools: Vec::new(),
            interactive: false,
            max_llm_calls: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_agents(mut self, agents: Vec<Agent>) -> Self {
        self.agents = Some(agents);
        self
    }

    pub fn with_completion_agents(mut self, agents: Vec<Agent>) -> Self {
        self.completion_agents = Some(agents);
        self
    }

    pub fn with_parent(mut self, parent: TaskKey) -> Self {
        self.parent = Parent::Of(parent);
        self
    }

    /// Create the task without a parent, even inside an active task.
    pub fn as_root(mut self) -> Self {
        self.parent = Parent::Root;
        self
    }

    pub fn with_dependency(mut self, task: TaskKey) -> Self {
        if !self.depends_on.contains(&task) {
            self.depends_on.push(task);
        }
        self
    }

    pub fn with_result_type(mut self, result_type: impl Into<ResultType>) -> Self {
        self.result_type = result_type.into();
        self
    }

    /// Declare that the task produces no result.
    pub fn without_result(mut self) -> Self {
        self.result_type = ResultType::None;
        self
    }

    pub fn with_result_validator(mut self, validator: ResultValidator) -> Self {
        self.result_validator = Some(validator);
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

    pub fn with_max_llm_calls(mut self, max: u32) -> Self {
        self.max_llm_calls = Some(max);
        self
    }

    /// Construction-time checks.
    pub fn validate(&self) -> DomainResult<()> {
        if matches!(&self.agents, Some(agents) if agents.is_empty()) {
            return Err(TaskError::EmptyAgents);
        }
        if self.max_llm_calls == Some(0) {
            return Err(TaskError::ZeroLlmCallBudget);
        }
        if let ResultType::Labels(labels) = &self.result_type {
            if labels.is_empty() {
                return Err(TaskError::EmptyLabels);
            }
        }
        Ok(())
    }

    /// Fingerprint over the fields that define what the task asks for.
    pub fn fingerprint(&self) -> String {
        let context = Value::Object(self.context.clone()).to_string();
        fingerprint(&(
            "Task",
            &self.objective,
            &self.instructions,
            self.result_type.descriptor(),
            &self.prompt,
            context,
        ))
    }
}

/// A task record owned by a graph.
#[derive(Debug, Clone)]
pub struct Task {
    key: TaskKey,
    id: String,
    pub name: Option<String>,
    pub objective: String,
    pub instructions: Option<String>,
    pub prompt: Option<String>,
    pub context: Map<String, Value>,
    agents: Option<Vec<Agent>>,
    completion_agents: Option<Vec<Agent>>,
    pub result_type: ResultType,
    pub result_validator: Option<ResultValidator>,
    pub tools: Vec<Tool>,
    pub interactive: bool,
    max_llm_calls: Option<u32>,
    status: TaskStatus,
    result: Option<Value>,
    llm_calls: u32,
    created_at: DateTime<Utc>,
    pub(crate) parent: Option<TaskKey>,
    pub(crate) subtasks: BTreeSet<TaskKey>,
    pub(crate) depends_on: BTreeSet<TaskKey>,
    pub(crate) downstream: BTreeSet<TaskKey>,
}

impl Task {
    /// Build the record for a validated definition. Edges are wired by
    /// the graph afterwards.
    pub(crate) fn from_definition(key: TaskKey, definition: TaskDefinition) -> Self {
        let id = definition.fingerprint();
        Self {
            key,
            id,
            name: definition.name,
            objective: definition.objective,
            instructions: definition.instructions,
            prompt: definition.prompt,
            context: definition.context,
            agents: definition.agents,
            completion_agents: definition.completion_agents,
            result_type: definition.result_type,
            result_validator: definition.result_validator,
            tools: definition.tools,
            interactive: definition.interactive,
            max_llm_calls: definition.max_llm_calls,
            status: TaskStatus::Pending,
            result: None,
            llm_calls: 0,
            created_at: Utc::now(),
            parent: None,
            subtasks: BTreeSet::new(),
            depends_on: BTreeSet::new(),
            downstream: BTreeSet::new(),
        }
    }

    pub fn key(&self) -> TaskKey {
        self.key
    }

    /// Fingerprint id, fixed at construction.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// The validated result once successful, or the failure reason.
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Decode a successful result into a concrete type.
    pub fn result_as<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        if !self.is_successful() {
            return None;
        }
        Some(serde_json::from_value(
            self.result.clone().unwrap_or(Value::Null),
        ))
    }

    /// The stored failure reason, if the task failed with one.
    pub fn failure_reason(&self) -> Option<&str> {
        if self.is_failed() {
            self.result.as_ref().and_then(Value::as_str)
        } else {
            None
        }
    }

    pub fn llm_calls(&self) -> u32 {
        self.llm_calls
    }

    /// LLM call budget over the task's lifetime; `None` is unlimited.
    pub fn max_llm_calls(&self) -> Option<u32> {
        self.max_llm_calls
    }

    /// Explicitly assigned agents; `None` defers to the parent chain.
    pub fn agents(&self) -> Option<&[Agent]> {
        self.agents.as_deref()
    }

    /// Agents allowed to complete the task; `None` allows any.
    pub fn completion_agents(&self) -> Option<&[Agent]> {
        self.completion_agents.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn parent(&self) -> Option<TaskKey> {
        self.parent
    }

    pub fn depends_on(&self) -> &BTreeSet<TaskKey> {
        &self.depends_on
    }

    pub fn downstream(&self) -> &BTreeSet<TaskKey> {
        &self.downstream
    }

    /// Subtask keys in key order. Use
    /// [`TaskGraph::subtasks`](crate::services::TaskGraph::subtasks) for
    /// creation order.
    pub fn subtask_keys(&self) -> &BTreeSet<TaskKey> {
        &self.subtasks
    }

    pub fn friendly_name(&self) -> String {
        let name = match &self.name {
            Some(name) => name.clone(),
            None if self.objective.chars().count() > FRIENDLY_NAME_MAX_CHARS => {
                let head: String = self.objective.chars().take(FRIENDLY_NAME_MAX_CHARS).collect();
                format!("\"{head}...\"")
            }
            None => format!("\"{}\"", self.objective),
        };
        format!("Task #{} ({name})", self.id)
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    pub fn is_running(&self) -> bool {
        self.status == TaskStatus::Running
    }

    pub fn is_successful(&self) -> bool {
        self.status == TaskStatus::Successful
    }

    pub fn is_failed(&self) -> bool {
        self.status == TaskStatus::Failed
    }

    pub fn is_skipped(&self) -> bool {
        self.status == TaskStatus::Skipped
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    pub fn is_incomplete(&self) -> bool {
        self.status.is_incomplete()
    }

    /// Whether `agent` may invoke this task's completion tools.
    pub fn can_be_completed_by(&self, agent: Option<&Agent>) -> bool {
        match (&self.completion_agents, agent) {
            (None, _) => true,
            (Some(allowed), Some(agent)) => allowed.contains(agent),
            (Some(_), None) => false,
        }
    }

    /// Tools available to any agent working this task.
    pub fn get_tools(&self) -> Vec<Tool> {
        let mut tools = self.tools.clone();
        if self.interactive {
            tools.push(human_input());
        }
        tools
    }

    /// Run the shape check, then the custom validator if one is attached.
    pub fn validate_result(&self, raw: Value) -> Result<Value, ValidationError> {
        let result = self.result_type.validate(raw)?;
        match &self.result_validator {
            Some(validator) => validator.apply(result),
            None => Ok(result),
        }
    }

    pub(crate) fn set_status(&mut self, status: TaskStatus) -> TaskStatus {
        std::mem::replace(&mut self.status, status)
    }

    pub(crate) fn set_result(&mut self, result: Option<Value>) {
        self.result = result;
    }

    pub(crate) fn increment_llm_calls(&mut self) {
        self.llm_calls += 1;
    }

    pub(crate) fn set_llm_calls(&mut self, llm_calls: u32) {
        self.llm_calls = llm_calls;
    }

    pub(crate) fn set_max_llm_calls(&mut self, max: Option<u32>) {
        self.max_llm_calls = max;
    }

    pub(crate) fn set_agents(&mut self, agents: Option<Vec<Agent>>) {
        self.agents = agents;
    }

    pub(crate) fn set_completion_agents(&mut self, agents: Option<Vec<Agent>>) {
        self.completion_agents = agents;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::result_type::Shape;
    use serde_json::json;

    fn record(definition: TaskDefinition) -> Task {
        Task::from_definition(TaskKey(0), definition)
    }

    #[test]
    fn test_status_completeness() {
        assert!(TaskStatus::Pending.is_incomplete());
        assert!(TaskStatus::Running.is_incomplete());
        assert!(TaskStatus::Successful.is_complete());
        assert!(TaskStatus::Failed.is_complete());
        assert!(TaskStatus::Skipped.is_complete());
    }

    #[test]
    fn test_status_round_trip_names() {
        assert_eq!(TaskStatus::from_str("successful"), Some(TaskStatus::Successful));
        assert_eq!(TaskStatus::from_str("SKIPPED"), Some(TaskStatus::Skipped));
        assert_eq!(TaskStatus::from_str("done"), None);
        assert_eq!(
            serde_json::to_value(TaskStatus::Running).unwrap(),
            json!("RUNNING")
        );
    }

    #[test]
    fn test_identical_definitions_share_fingerprint() {
        let a = TaskDefinition::new("classify").with_context("text", "hello");
        let b = TaskDefinition::new("classify").with_context("text", "hello");
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c = TaskDefinition::new("classify").with_result_type(Shape::Integer);
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_empty_agent_list_rejected() {
        let definition = TaskDefinition::new("work").with_agents(vec![]);
        assert!(matches!(definition.validate(), Err(TaskError::EmptyAgents)));
        assert!(TaskDefinition::new("work").validate().is_ok());
    }

    #[test]
    fn test_zero_llm_call_budget_rejected() {
        let definition = TaskDefinition::new("work").with_max_llm_calls(0);
        assert!(matches!(definition.validate(), Err(TaskError::ZeroLlmCallBudget)));
        assert!(TaskDefinition::new("work").with_max_llm_calls(1).validate().is_ok());
    }

    #[test]
    fn test_friendly_name() {
        let task = record(TaskDefinition::new("Write a haiku"));
        assert_eq!(task.friendly_name(), format!("Task #{} (\"Write a haiku\")", task.id()));

        let named = record(TaskDefinition::new("Write a haiku").with_name("poem"));
        assert!(named.friendly_name().ends_with("(poem)"));

        let long = record(TaskDefinition::new("x".repeat(80)));
        assert!(long.friendly_name().ends_with(&format!("\"{}...\")", "x".repeat(50))));
    }

    #[test]
    fn test_completion_agents_gate() {
        let alice = Agent::new("alice");
        let bob = Agent::new("bob");
        let open = record(TaskDefinition::new("open"));
        assert!(open.can_be_completed_by(Some(&bob)));
        assert!(open.can_be_completed_by(None));

        let gated = record(TaskDefinition::new("gated").with_completion_agents(vec![alice.clone()]));
        assert!(gated.can_be_completed_by(Some(&alice)));
        assert!(!gated.can_be_completed_by(Some(&bob)));
        assert!(!gated.can_be_completed_by(None));
    }

    #[test]
    fn test_interactive_task_adds_human_input() {
        let task = record(TaskDefinition::new("ask").interactive());
        assert_eq!(task.get_tools().len(), 1);
    }

    #[test]
    fn test_result_as_decodes_successful_result() {
        let mut task = record(TaskDefinition::new("count").with_result_type(Shape::Integer));
        assert!(task.result_as::<i64>().is_none());
        task.set_result(Some(json!(4)));
        task.set_status(TaskStatus::Successful);
        assert_eq!(task.result_as::<i64>().unwrap().unwrap(), 4);
    }
}
