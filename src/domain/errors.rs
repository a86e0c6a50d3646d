//! Domain errors for the taskweave engine.

use serde_json::Value;
use thiserror::Error;

/// Render a list of label options as `[a, b, c]`.
fn format_options(options: &[Value]) -> String {
    let rendered = options
        .iter()
        .map(|option| match option {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{rendered}]")
}

/// Errors raised while reconciling a raw result against a declared shape.
///
/// These are recoverable: completion tools hand the message back to the
/// agent so it can retry with corrected input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Task expects no result, but a result was provided: {0}")]
    UnexpectedResult(Value),

    #[error("Result {value} is not in the list of valid options: {}", format_options(.options))]
    InvalidOption { value: Value, options: Vec<Value> },

    #[error("Invalid option {given}. Please choose an index between 0 and {}", .count.saturating_sub(1))]
    InvalidIndex { given: String, count: usize },

    #[error("{path}: expected {expected}, found {found}")]
    Mismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("{path}: missing required field")]
    MissingField { path: String },

    #[error("{path}: unexpected field")]
    UnknownField { path: String },

    #[error("Could not construct {shape}: {reason}")]
    Construction { shape: String, reason: String },

    #[error("{0}")]
    Rejected(String),
}

/// Errors raised by task graph operations.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Agents must be `None` or a non-empty list of agents")]
    EmptyAgents,

    #[error("Labels must contain at least one option")]
    EmptyLabels,

    #[error("max_llm_calls must be at least 1; leave it unset for no limit")]
    ZeroLlmCallBudget,

    #[error("{task} already has a parent")]
    AlreadyHasParent { task: String },

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error(
        "Could not load or infer schema for result type {0}. Please use a custom type or add compatibility."
    )]
    SchemaUnavailable(String),

    #[error("{task} is already marked successful")]
    AlreadySuccessful { task: String },

    #[error("{task} failed: {reason}")]
    TaskFailed { task: String, reason: String },

    #[error("Invalid result: {0}")]
    Validation(#[from] ValidationError),

    #[error("Orchestration failed: {0}")]
    Orchestration(String),
}

pub type DomainResult<T> = Result<T, TaskError>;

/// Errors surfaced to an agent that invoked a completion tool.
#[derive(Debug, Error)]
pub enum ToolCallError {
    #[error("Tool {tool} received invalid arguments: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error(transparent)]
    Task(#[from] TaskError),
}

impl ToolCallError {
    /// Text handed back to the agent in place of a tool result.
    pub fn agent_message(&self) -> String {
        format!("Error: {self}")
    }
}
