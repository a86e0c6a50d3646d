pub mod agent;
pub mod config;
pub mod flow;
pub mod result_type;
pub mod snapshot;
pub mod task;
pub mod tool;

pub use agent::{Agent, AgentSummary, DEFAULT_AGENT_INSTRUCTIONS};
pub use config::{
    Config, DefaultsConfig, LogFormat, LoggingConfig, OrchestrationConfig, RotationPolicy,
};
pub use flow::Flow;
pub use result_type::{
    CustomShape, FieldShape, Labels, ObjectShape, ResultType, ResultValidator, Shape, ShapeArgs,
};
pub use snapshot::{ResultTypeSummary, TaskSnapshot};
pub use task::{Parent, Task, TaskDefinition, TaskKey, TaskStatus};
pub use tool::{human_input, Tool, ToolDefinition, ToolSummary, HUMAN_INPUT_TOOL};
