//! Completion tools: the two capabilities through which an agent reports
//! the outcome of a task.
//!
//! Each tool is bound to one task and named after its fingerprint, so the
//! tools of several active tasks can share one agent toolset. A tool is
//! built from the task's current result type; building is pure, invoking
//! mutates the graph.

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::task_graph::TaskGraph;
use crate::domain::errors::{DomainResult, TaskError, ToolCallError, ValidationError};
use crate::domain::models::{Labels, ResultType, Shape, TaskKey, ToolDefinition};

const SUCCESS_INSTRUCTIONS: &str = "Use this tool to mark the task as successful and provide a result. \
This tool can only be used one time per task.";

const LABELS_INSTRUCTIONS: &str = "Provide a single integer as the result, corresponding to the index \
of your chosen option. Your options are:";

#[derive(Debug, Clone, PartialEq)]
pub enum CompletionKind {
    /// Labels are chosen by index when `options` is set.
    Succeed { options: Option<Labels> },
    Fail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionTool {
    task: TaskKey,
    task_id: String,
    pub name: String,
    pub description: String,
    pub instructions: Option<String>,
    pub parameters: Value,
    pub kind: CompletionKind,
}

pub fn success_tool_name(task_id: &str) -> String {
    format!("mark_task_{task_id}_successful")
}

pub fn failure_tool_name(task_id: &str) -> String {
    format!("mark_task_{task_id}_failed")
}

fn render_option(option: &Value) -> String {
    match option {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn single_argument(name: &str, schema: Value, required: bool) -> Value {
    let mut properties = Map::new();
    properties.insert(name.to_string(), schema);
    let required: Vec<&str> = if required { vec![name] } else { Vec::new() };
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

impl CompletionTool {
    /// Build the success tool for `key`. Fails when the result shape has
    /// no schema to advertise.
    pub fn success(graph: &TaskGraph, key: TaskKey) -> DomainResult<Self> {
        let task = graph.task(key)?;
        let id = task.id().to_string();
        let mut instructions = SUCCESS_INSTRUCTIONS.to_string();

        let (parameters, options) = match &task.result_type {
            ResultType::None => (single_argument("result", json!({ "type": "null" }), false), None),
            ResultType::Labels(labels) => {
                let listed = labels
                    .iter()
                    .enumerate()
                    .map(|(i, option)| format!("Option {i}: {}", render_option(option)))
                    .collect::<Vec<_>>()
                    .join("\n\n");
                instructions = format!("{instructions}\n\n{LABELS_INSTRUCTIONS}\n\n{listed}");
                let schema = json!({
                    "type": "integer",
                    "minimum": 0,
                    "maximum": labels.len() - 1,
                });
                (single_argument("result", schema, true), Some(labels.clone()))
            }
            ResultType::Value(shape) => {
                let schema = shape
                    .json_schema()
                    .ok_or_else(|| TaskError::SchemaUnavailable(shape.descriptor()))?;
                (single_argument("result", schema, true), None)
            }
        };

        Ok(Self {
            task: key,
            name: success_tool_name(&id),
            description: format!("Mark task {id} as successful."),
            instructions: Some(instructions),
            parameters,
            kind: CompletionKind::Succeed { options },
            task_id: id,
        })
    }

    pub fn failure(graph: &TaskGraph, key: TaskKey) -> DomainResult<Self> {
        let id = graph.task(key)?.id().to_string();
        Ok(Self {
            task: key,
            name: failure_tool_name(&id),
            description: format!(
                "Mark task {id} as failed. Only use when technical errors prevent success. \
                 Provide a detailed reason for the failure."
            ),
            instructions: None,
            parameters: single_argument("reason", json!({ "type": "string" }), true),
            kind: CompletionKind::Fail,
            task_id: id,
        })
    }

    pub fn task(&self) -> TaskKey {
        self.task
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// What an LLM function-calling API is shown.
    pub fn definition(&self) -> ToolDefinition {
        let description = match &self.instructions {
            Some(instructions) => format!("{}\n\n{}", self.description, instructions),
            None => self.description.clone(),
        };
        ToolDefinition {
            name: self.name.clone(),
            description,
            parameters: self.parameters.clone(),
        }
    }

    /// Apply the tool to the graph with the arguments the agent supplied.
    /// Errors are meant to be shown to the agent, see
    /// [`ToolCallError::agent_message`].
    pub fn invoke(&self, graph: &mut TaskGraph, args: Value) -> Result<String, ToolCallError> {
        let outcome = match &self.kind {
            CompletionKind::Succeed { options } => self.succeed(graph, options.as_ref(), args),
            CompletionKind::Fail => self.fail(graph, args),
        };
        if let Err(e) = &outcome {
            warn!(tool = %self.name, error = %e, "completion tool call rejected");
        }
        outcome
    }

    fn arguments(&self, args: Value) -> Result<Map<String, Value>, ToolCallError> {
        match args {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            other => Err(ToolCallError::InvalidArguments {
                tool: self.name.clone(),
                reason: format!("expected an object, found {other}"),
            }),
        }
    }

    fn succeed(
        &self,
        graph: &mut TaskGraph,
        options: Option<&Labels>,
        args: Value,
    ) -> Result<String, ToolCallError> {
        let task = graph.task(self.task)?;
        if task.is_successful() {
            return Err(TaskError::AlreadySuccessful {
                task: task.friendly_name(),
            }
            .into());
        }

        let raw = self
            .arguments(args)?
            .remove("result")
            .unwrap_or(Value::Null);
        let result = match options {
            Some(labels) => pick_option(labels, &raw).map_err(TaskError::from)?,
            None => raw,
        };

        graph.mark_successful(self.task, result)?;
        let friendly = graph.task(self.task)?.friendly_name();
        info!(tool = %self.name, "task completed by agent");
        Ok(format!("{friendly} marked successful."))
    }

    fn fail(&self, graph: &mut TaskGraph, args: Value) -> Result<String, ToolCallError> {
        let reason = match self.arguments(args)?.remove("reason") {
            Some(Value::String(reason)) => reason,
            Some(Value::Null) | None => {
                return Err(ToolCallError::InvalidArguments {
                    tool: self.name.clone(),
                    reason: "missing `reason` argument".to_string(),
                })
            }
            Some(other) => other.to_string(),
        };

        graph.mark_failed(self.task, reason)?;
        let friendly = graph.task(self.task)?.friendly_name();
        Ok(format!("{friendly} marked failed."))
    }
}

/// Resolve an agent-supplied index to the option it names.
fn pick_option(labels: &Labels, raw: &Value) -> Result<Value, ValidationError> {
    let invalid = || ValidationError::InvalidIndex {
        given: render_option(raw),
        count: labels.len(),
    };
    let index = Shape::Integer
        .validate(raw)
        .ok()
        .and_then(|v| v.as_u64())
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(invalid)?;
    labels.get(index).cloned().ok_or_else(invalid)
}
