//! `taskweave tools`: show the completion tools for one task.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::cli::types::ToolsArgs;
use crate::domain::models::{Agent, ToolDefinition};
use crate::infrastructure::graph_file::{AgentTemplate, GraphFile, LoadedGraph};

#[derive(Debug, Serialize)]
pub struct ToolsOutput {
    pub task: String,
    pub agent: Option<String>,
    pub tools: Vec<ToolDefinition>,
}

impl CommandOutput for ToolsOutput {
    fn to_human(&self) -> String {
        if self.tools.is_empty() {
            return format!(
                "Agent {} may not complete task '{}'",
                self.agent.as_deref().unwrap_or("(none)"),
                self.task
            );
        }
        TableFormatter::new().format_tools(&self.tools)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.tools).unwrap_or_default()
    }
}

/// Look up an agent declared in the graph file.
pub fn find_agent(loaded: &LoadedGraph, name: &str) -> Result<Agent> {
    loaded
        .file
        .agents
        .iter()
        .find(|a| a.name == name)
        .map(AgentTemplate::to_agent)
        .with_context(|| format!("Unknown agent '{name}'"))
}

pub fn tools(loaded: &LoadedGraph, task: &str, agent: Option<&str>) -> Result<ToolsOutput> {
    let key = loaded
        .key(task)
        .with_context(|| format!("Unknown task key '{task}'"))?;
    let agent = agent.map(|name| find_agent(loaded, name)).transpose()?;
    let tools = loaded
        .graph
        .completion_tools(key, agent.as_ref())?
        .iter()
        .map(|tool| tool.definition())
        .collect();

    Ok(ToolsOutput {
        task: task.to_string(),
        agent: agent.map(|a| a.name),
        tools,
    })
}

pub fn execute(args: ToolsArgs, json_mode: bool) -> Result<()> {
    let loaded = GraphFile::load(&args.graph)?.build()?;
    output(&tools(&loaded, &args.key, args.agent.as_deref())?, json_mode);
    Ok(())
}
