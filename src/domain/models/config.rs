use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::agent::DEFAULT_AGENT_INSTRUCTIONS;

/// Main configuration structure for taskweave
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Process-wide defaults applied to new tasks
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Budgets handed to orchestrators
    #[serde(default)]
    pub orchestration: OrchestrationConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,

    /// Directory for log files (stdout only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Also log to stdout when writing files
    #[serde(default = "default_true")]
    pub enable_stdout: bool,

    /// Log file rotation policy
    #[serde(default)]
    pub rotation: RotationPolicy,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_dir: None,
            enable_stdout: true,
            rotation: RotationPolicy::default(),
        }
    }
}

/// Defaults for tasks and agents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DefaultsConfig {
    /// Name of the process-wide default agent
    #[serde(default = "default_agent_name")]
    pub agent_name: String,

    /// Instructions for the default agent
    #[serde(default = "default_agent_instructions")]
    pub agent_instructions: String,

    /// LLM call budget over a task's lifetime (unlimited when unset)
    #[serde(default)]
    pub task_max_llm_calls: Option<u32>,
}

fn default_agent_name() -> String {
    "Marvin".to_string()
}

fn default_agent_instructions() -> String {
    DEFAULT_AGENT_INSTRUCTIONS.to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            agent_name: default_agent_name(),
            agent_instructions: default_agent_instructions(),
            task_max_llm_calls: None,
        }
    }
}

/// Orchestration budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OrchestrationConfig {
    /// Maximum agent turns per orchestration session
    #[serde(default = "default_max_agent_turns")]
    pub max_agent_turns: Option<u32>,

    /// Maximum LLM calls per orchestration session
    #[serde(default = "default_max_llm_calls")]
    pub max_llm_calls: Option<u32>,
}

#[allow(clippy::unnecessary_wraps)]
const fn default_max_agent_turns() -> Option<u32> {
    Some(100)
}

#[allow(clippy::unnecessary_wraps)]
const fn default_max_llm_calls() -> Option<u32> {
    Some(1000)
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            max_agent_turns: default_max_agent_turns(),
            max_llm_calls: default_max_llm_calls(),
        }
    }
}
