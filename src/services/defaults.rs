//! Process-wide defaults.
//!
//! The default agent is the last link of the agent resolution chain. It is
//! installed once, usually from configuration at startup; until then the
//! built-in configuration defaults apply.

use std::sync::OnceLock;

use crate::domain::models::{Agent, DefaultsConfig};

static DEFAULTS: OnceLock<Defaults> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Defaults {
    pub agent: Agent,
    pub task_max_llm_calls: Option<u32>,
}

impl Defaults {
    pub fn from_config(config: &DefaultsConfig) -> Self {
        Self {
            agent: Agent::new(&config.agent_name).with_instructions(&config.agent_instructions),
            task_max_llm_calls: config.task_max_llm_calls,
        }
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self::from_config(&DefaultsConfig::default())
    }
}

/// Install the process-wide defaults. Fails with the rejected value if
/// defaults were already installed or read.
pub fn install(defaults: Defaults) -> Result<(), Defaults> {
    DEFAULTS.set(defaults)
}

pub fn get() -> &'static Defaults {
    DEFAULTS.get_or_init(Defaults::default)
}

/// The process-wide default agent.
pub fn agent() -> Agent {
    get().agent.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_config() {
        let config = DefaultsConfig {
            agent_name: "Arthur".to_string(),
            agent_instructions: "Be curious.".to_string(),
            task_max_llm_calls: Some(12),
        };
        let defaults = Defaults::from_config(&config);
        assert_eq!(defaults.agent.name, "Arthur");
        assert_eq!(defaults.agent.instructions.as_deref(), Some("Be curious."));
        assert_eq!(defaults.task_max_llm_calls, Some(12));
    }

    #[test]
    fn test_builtin_default_agent() {
        assert_eq!(Defaults::default().agent.name, DefaultsConfig::default().agent_name);
    }
}
