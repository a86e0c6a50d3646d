//! Tools: callable capabilities offered to agents through function calling.

use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

type ToolHandler = dyn Fn(Value) -> Result<String, String> + Send + Sync;

/// Name of the built-in tool that asks a human for input.
pub const HUMAN_INPUT_TOOL: &str = "human_input";

/// The part of a tool an LLM sees: name, description and argument schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Compact form used when a tool is mentioned inside a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

/// A named capability with a JSON argument schema and a handler.
#[derive(Clone)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub instructions: Option<String>,
    pub parameters: Value,
    handler: Arc<ToolHandler>,
}

impl Tool {
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(Value) -> Result<String, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            instructions: None,
            parameters,
            handler: Arc::new(handler),
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Invoke the handler with the arguments an agent supplied.
    pub fn call(&self, args: Value) -> Result<String, String> {
        tracing::debug!(tool = %self.name, "invoking tool");
        (self.handler)(args)
    }

    pub fn definition(&self) -> ToolDefinition {
        let description = match &self.instructions {
            Some(instructions) => format!("{}\n\n{}", self.description, instructions.trim()),
            None => self.description.clone(),
        };
        ToolDefinition {
            name: self.name.clone(),
            description,
            parameters: self.parameters.clone(),
        }
    }

    pub fn summary(&self) -> ToolSummary {
        ToolSummary {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Tool that lets an agent ask the human at the terminal a question.
pub fn human_input() -> Tool {
    Tool::new(
        HUMAN_INPUT_TOOL,
        "Send a message to the human user and wait for their reply.",
        json!({
            "type": "object",
            "properties": {
                "message": { "type": "string", "description": "The message to show the user" }
            },
            "required": ["message"]
        }),
        |args| {
            let message = args
                .get("message")
                .and_then(Value::as_str)
                .ok_or_else(|| "missing `message` argument".to_string())?;
            let mut stderr = io::stderr();
            writeln!(stderr, "Agent: {message}").map_err(|e| e.to_string())?;
            write!(stderr, "Type your response: ").map_err(|e| e.to_string())?;
            stderr.flush().map_err(|e| e.to_string())?;

            let mut reply = String::new();
            io::stdin()
                .lock()
                .read_line(&mut reply)
                .map_err(|e| e.to_string())?;
            Ok(format!("User response: {}", reply.trim_end()))
        },
    )
}
