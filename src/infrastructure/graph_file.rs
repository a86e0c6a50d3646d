//! Task graphs declared in YAML files.
//!
//! A graph file names agents once and lists tasks with a file-local
//! `key`; parents and dependencies refer to those keys. Status, result
//! and call counts are written back on save so a graph can be inspected
//! and advanced across invocations.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::domain::models::{Agent, Labels, ResultType, Shape, TaskDefinition, TaskKey, TaskStatus};
use crate::services::TaskGraph;

/// Top-level document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<AgentTemplate>,
    pub tasks: Vec<TaskTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTemplate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub interactive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub key: String,
    pub objective: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub context: Map<String, Value>,
    /// Type descriptor such as `int` or `list[str]`; `none` for no result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<Value>>,
    /// Agent names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agents: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_agents: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub interactive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_llm_calls: Option<u32>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub llm_calls: u32,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl AgentTemplate {
    pub fn to_agent(&self) -> Agent {
        let mut agent = Agent::new(&self.name);
        if let Some(description) = &self.description {
            agent = agent.with_description(description);
        }
        if let Some(instructions) = &self.instructions {
            agent = agent.with_instructions(instructions);
        }
        if self.interactive {
            agent = agent.interactive();
        }
        agent
    }
}

impl TaskTemplate {
    fn result_type(&self) -> Result<ResultType> {
        match (&self.labels, self.result_type.as_deref()) {
            (Some(_), Some(_)) => bail!(
                "task '{}' declares both labels and result_type",
                self.key
            ),
            (Some(labels), None) => Ok(ResultType::Labels(Labels::new(labels.clone())?)),
            (None, Some(descriptor)) if descriptor.eq_ignore_ascii_case("none") => {
                Ok(ResultType::None)
            }
            (None, Some(descriptor)) => descriptor
                .parse::<Shape>()
                .map(ResultType::Value)
                .map_err(|e| anyhow::anyhow!("task '{}': {e}", self.key)),
            (None, None) => Ok(ResultType::default()),
        }
    }
}

/// A graph built from a [`GraphFile`], with the file-local keys
#[derive(Debug)]
pub struct LoadedGraph {
    pub file: GraphFile,
    pub graph: TaskGraph,
    keys: Vec<(String, TaskKey)>,
}

impl LoadedGraph {
    pub fn key(&self, name: &str) -> Option<TaskKey> {
        self.keys.iter().find(|(k, _)| k == name).map(|(_, key)| *key)
    }

    /// File-local name of a graph key
    pub fn name_of(&self, key: TaskKey) -> Option<&str> {
        self.keys.iter().find(|(_, k)| *k == key).map(|(name, _)| name.as_str())
    }

    /// Keys in file order
    pub fn keys(&self) -> impl Iterator<Item = (&str, TaskKey)> {
        self.keys.iter().map(|(name, key)| (name.as_str(), *key))
    }

    /// Copy task state back into the document
    pub fn sync(&mut self) {
        for (template, (_, key)) in self.file.tasks.iter_mut().zip(&self.keys) {
            if let Some(task) = self.graph.get(*key) {
                template.status = task.status();
                template.result = task.result().cloned();
                template.llm_calls = task.llm_calls();
            }
        }
    }

    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.sync();
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(&self.file).context("Failed to serialize graph")?;
        fs::write(path, yaml).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), tasks = self.keys.len(), "graph saved");
        Ok(())
    }
}

impl GraphFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse graph file {}", path.display()))
    }

    /// Build the task graph. Edges are wired after every task exists, so
    /// keys may be referenced before they are declared.
    pub fn build(self) -> Result<LoadedGraph> {
        let agents: HashMap<&str, Agent> = self
            .agents
            .iter()
            .map(|a| (a.name.as_str(), a.to_agent()))
            .collect();
        let resolve_agents = |names: &Option<Vec<String>>, key: &str| -> Result<Option<Vec<Agent>>> {
            names
                .as_ref()
                .map(|names| {
                    names
                        .iter()
                        .map(|name| {
                            agents.get(name.as_str()).cloned().with_context(|| {
                                format!("task '{key}' references unknown agent '{name}'")
                            })
                        })
                        .collect::<Result<Vec<_>>>()
                })
                .transpose()
        };

        let mut graph = TaskGraph::new();
        let mut keys: Vec<(String, TaskKey)> = Vec::with_capacity(self.tasks.len());
        for template in &self.tasks {
            if keys.iter().any(|(k, _)| *k == template.key) {
                bail!("duplicate task key '{}'", template.key);
            }
            let mut definition = TaskDefinition::new(&template.objective)
                .with_result_type(template.result_type()?)
                .as_root();
            definition.name = template.name.clone();
            definition.instructions = template.instructions.clone();
            definition.prompt = template.prompt.clone();
            definition.context = template.context.clone();
            definition.agents = resolve_agents(&template.agents, &template.key)?;
            definition.completion_agents =
                resolve_agents(&template.completion_agents, &template.key)?;
            definition.interactive = template.interactive;
            definition.max_llm_calls = template.max_llm_calls;

            let key = graph
                .insert(definition)
                .with_context(|| format!("invalid task '{}'", template.key))?;
            graph.restore_state(key, template.status, template.result.clone(), template.llm_calls)?;
            keys.push((template.key.clone(), key));
        }

        let lookup = |name: &str, owner: &str| -> Result<TaskKey> {
            keys.iter()
                .find(|(k, _)| k == name)
                .map(|(_, key)| *key)
                .with_context(|| format!("task '{owner}' references unknown task '{name}'"))
        };
        for template in &self.tasks {
            let key = lookup(&template.key, &template.key)?;
            if let Some(parent) = &template.parent {
                graph.add_subtask(lookup(parent, &template.key)?, key)?;
            }
            for dependency in &template.depends_on {
                graph.add_dependency(key, lookup(dependency, &template.key)?)?;
            }
        }

        debug!(tasks = keys.len(), "graph built");
        Ok(LoadedGraph {
            file: self,
            graph,
            keys,
        })
    }
}
