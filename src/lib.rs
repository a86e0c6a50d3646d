//! Taskweave - a task graph engine for agent orchestration
//!
//! Tasks are units of delegated work with an objective, dependencies, a
//! lifecycle status and a declared result shape. Agents report outcomes
//! through per-task completion tools; results are validated against the
//! declared shape before a task is marked successful.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): task model, result shapes, errors and ports
//! - **Service Layer** (`services`): the task graph, completion tools, agent
//!   resolution and execution entry points
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging and
//!   YAML graph files
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use taskweave::{ResultType, TaskDefinition, TaskGraph};
//!
//! let mut graph = TaskGraph::new();
//! let pick = graph
//!     .insert(
//!         TaskDefinition::new("Pick a color")
//!             .with_result_type(ResultType::labels(["red", "green", "blue"]).unwrap()),
//!     )
//!     .unwrap();
//!
//! let tools = graph.completion_tools(pick, None).unwrap();
//! tools[0].invoke(&mut graph, json!({ "result": 1 })).unwrap();
//! assert_eq!(graph.task(pick).unwrap().result(), Some(&json!("green")));
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Agent, Config, Flow, Labels, LoggingConfig, ObjectShape, Parent, ResultType, ResultValidator,
    Shape, Task, TaskDefinition, TaskKey, TaskSnapshot, TaskStatus, Tool,
};
pub use domain::ports::{Orchestrator, PromptRenderer, RunOptions, StatusObserver};
pub use domain::{DomainResult, TaskError, ToolCallError, ValidationError};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{CompletionTool, DependencyResolver, ExecutionContext, TaskGraph, TaskRunner};
