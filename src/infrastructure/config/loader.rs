use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Directory holding project configuration, relative to the project root
pub const CONFIG_DIR: &str = ".taskweave";

/// Prefix of environment overrides; `__` separates nested keys
pub const ENV_PREFIX: &str = "TASKWEAVE_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Default agent name cannot be empty")]
    EmptyAgentName,

    #[error("Invalid {0}: 0. Leave it unset for no limit")]
    ZeroBudget(&'static str),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the project in the current directory
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .taskweave/config.yaml (project config)
    /// 3. .taskweave/local.yaml (local overrides, optional)
    /// 4. Environment variables (TASKWEAVE_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        Self::load_from(Path::new("."))
    }

    /// Load configuration for the project rooted at `root`
    pub fn load_from(root: &Path) -> Result<Config> {
        let dir = root.join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, without environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        if config.defaults.agent_name.trim().is_empty() {
            return Err(ConfigError::EmptyAgentName);
        }

        let budgets = [
            ("defaults.task_max_llm_calls", config.defaults.task_max_llm_calls),
            ("orchestration.max_agent_turns", config.orchestration.max_agent_turns),
            ("orchestration.max_llm_calls", config.orchestration.max_llm_calls),
        ];
        for (name, value) in budgets {
            if value == Some(0) {
                return Err(ConfigError::ZeroBudget(name));
            }
        }

        Ok(())
    }
}
