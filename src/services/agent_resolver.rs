//! Resolution of the agents allowed to work a task.
//!
//! The nearest explicit assignment wins: the task's own agents, then each
//! ancestor's, then the flow default agent, then the process default.

use std::collections::BTreeSet;

use tracing::warn;

use super::defaults;
use super::task_graph::TaskGraph;
use crate::domain::errors::DomainResult;
use crate::domain::models::{Agent, Flow, TaskKey};

pub struct AgentResolver<'a> {
    graph: &'a TaskGraph,
    flow: Option<&'a Flow>,
}

impl<'a> AgentResolver<'a> {
    pub fn new(graph: &'a TaskGraph, flow: Option<&'a Flow>) -> Self {
        Self { graph, flow }
    }

    pub fn resolve(&self, key: TaskKey) -> DomainResult<Vec<Agent>> {
        let mut visited = BTreeSet::new();
        let mut current = Some(key);
        while let Some(key) = current {
            if !visited.insert(key) {
                warn!(task = %key, "parent chain loops; using fallback agent");
                break;
            }
            let task = self.graph.task(key)?;
            if let Some(agents) = task.agents() {
                return Ok(agents.to_vec());
            }
            current = task.parent();
        }
        Ok(vec![self.fallback()])
    }

    /// Flow default agent, else the process-wide default.
    pub fn fallback(&self) -> Agent {
        self.flow
            .and_then(|flow| flow.default_agent.clone())
            .unwrap_or_else(defaults::agent)
    }
}
