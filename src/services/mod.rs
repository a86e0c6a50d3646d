//! Services: the task graph and the operations built on it.

pub mod agent_resolver;
pub mod completion_tools;
pub mod defaults;
pub mod dependency_resolver;
pub mod execution_context;
pub mod prompt;
pub mod task_graph;
pub mod task_runner;

pub use agent_resolver::AgentResolver;
pub use completion_tools::{failure_tool_name, success_tool_name, CompletionKind, CompletionTool};
pub use defaults::Defaults;
pub use dependency_resolver::{CycleError, DependencyResolver};
pub use execution_context::ExecutionContext;
pub use prompt::{task_prompt, MarkdownTaskRenderer};
pub use task_graph::{TaskGraph, TaskNode, MAX_LLM_CALLS_REASON};
pub use task_runner::TaskRunner;
