//! `taskweave call`: invoke a completion tool against a graph file.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::cli::output::{output, CommandOutput};
use crate::cli::types::CallArgs;
use crate::domain::models::TaskStatus;
use crate::infrastructure::graph_file::{GraphFile, LoadedGraph};
use crate::infrastructure::logging::TracingObserver;
use crate::services::{failure_tool_name, success_tool_name, CompletionTool};

#[derive(Debug, Serialize)]
pub struct CallOutput {
    pub tool: String,
    pub task: String,
    pub message: String,
    pub status: TaskStatus,
    pub result: Option<Value>,
    pub written: bool,
}

impl CommandOutput for CallOutput {
    fn to_human(&self) -> String {
        let mut out = self.message.clone();
        if self.written {
            out.push_str("\nGraph file updated.");
        }
        out
    }
}

/// Find the completion tool called `name` among all tasks of the graph.
pub fn find_tool(loaded: &LoadedGraph, name: &str) -> Result<CompletionTool> {
    for task in loaded.graph.iter() {
        if name == success_tool_name(task.id()) {
            return Ok(CompletionTool::success(&loaded.graph, task.key())?);
        }
        if name == failure_tool_name(task.id()) {
            return Ok(CompletionTool::failure(&loaded.graph, task.key())?);
        }
    }
    Err(anyhow!("No task offers a tool named '{name}'"))
}

/// Invoke `tool_name` with `args`. Tool errors carry the text an agent
/// would have received.
pub fn call(loaded: &mut LoadedGraph, tool_name: &str, args: Value) -> Result<CallOutput> {
    let tool = find_tool(loaded, tool_name)?;
    let message = tool
        .invoke(&mut loaded.graph, args)
        .map_err(|e| anyhow!(e.agent_message()))?;
    let task = loaded.graph.task(tool.task())?;

    Ok(CallOutput {
        tool: tool.name.clone(),
        task: loaded
            .name_of(tool.task())
            .map_or_else(|| tool.task().to_string(), str::to_string),
        message,
        status: task.status(),
        result: task.result().cloned(),
        written: false,
    })
}

pub fn execute(args: CallArgs, json_mode: bool) -> Result<()> {
    let mut loaded = GraphFile::load(&args.graph)?.build()?;
    loaded.graph.set_observer(Some(Arc::new(TracingObserver)));
    let tool_args: Value = serde_json::from_str(&args.args)
        .with_context(|| format!("Tool arguments are not valid JSON: {}", args.args))?;

    let mut result = call(&mut loaded, &args.tool, tool_args)?;
    if args.write {
        loaded.save(&args.graph)?;
        result.written = true;
    }
    output(&result, json_mode);
    Ok(())
}
