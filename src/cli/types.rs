//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "taskweave")]
#[command(about = "Taskweave - inspect and complete task graphs", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show every task in a graph file with its status and readiness
    Inspect(InspectArgs),

    /// Show the completion tools an agent would receive for a task
    Tools(ToolsArgs),

    /// Invoke a completion tool the way an agent would
    Call(CallArgs),
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Graph file (YAML)
    pub graph: PathBuf,
}

#[derive(Args, Debug)]
pub struct ToolsArgs {
    /// Graph file (YAML)
    pub graph: PathBuf,

    /// Task key as written in the graph file
    pub key: String,

    /// Agent requesting the tools (must be declared in the graph file)
    #[arg(short, long)]
    pub agent: Option<String>,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Graph file (YAML)
    pub graph: PathBuf,

    /// Tool name, e.g. mark_task_1a2b3c4d_successful
    pub tool: String,

    /// Tool arguments as a JSON object, e.g. '{"result": 3}'
    pub args: String,

    /// Write the updated graph back to the file
    #[arg(short, long)]
    pub write: bool,
}
