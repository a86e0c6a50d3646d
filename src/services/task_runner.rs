//! Execution entry points for a single task.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use super::task_graph::TaskGraph;
use crate::domain::errors::{DomainResult, TaskError};
use crate::domain::models::{OrchestrationConfig, TaskKey, TaskStatus};
use crate::domain::ports::{Orchestrator, RunOptions};

/// Runs one task at a time through an [`Orchestrator`] and maps the
/// final status to a result.
#[derive(Clone)]
pub struct TaskRunner {
    orchestrator: Arc<dyn Orchestrator>,
    options: RunOptions,
}

impl TaskRunner {
    pub fn new(orchestrator: Arc<dyn Orchestrator>) -> Self {
        Self {
            orchestrator,
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Take session budgets from configuration, keeping any agent or flow
    /// already set.
    pub fn with_config(mut self, config: &OrchestrationConfig) -> Self {
        self.options.max_llm_calls = config.max_llm_calls;
        self.options.max_agent_turns = config.max_agent_turns;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Advance `key` to completion. Returns the validated result when the
    /// task succeeded, `None` when it is still incomplete, and
    /// [`TaskError::TaskFailed`] when it failed.
    #[instrument(skip(self, graph))]
    pub async fn run_async(
        &self,
        graph: &mut TaskGraph,
        key: TaskKey,
    ) -> DomainResult<Option<Value>> {
        graph.task(key)?;
        self.orchestrator
            .run_tasks(graph, &[key], &self.options)
            .await
            .map_err(|e| TaskError::Orchestration(format!("{e:#}")))?;
        outcome(graph, key)
    }

    /// Blocking variant of [`run_async`](Self::run_async) on a
    /// current-thread runtime. Inside an async runtime it returns
    /// [`TaskError::Orchestration`] without touching the task.
    pub fn run(&self, graph: &mut TaskGraph, key: TaskKey) -> DomainResult<Option<Value>> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(TaskError::Orchestration(
                "run called inside an async runtime; use run_async".to_string(),
            ));
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TaskError::Orchestration(format!("failed to start runtime: {e}")))?;
        runtime.block_on(self.run_async(graph, key))
    }
}

fn outcome(graph: &TaskGraph, key: TaskKey) -> DomainResult<Option<Value>> {
    let task = graph.task(key)?;
    debug!(status = %task.status(), "orchestrator returned");
    match task.status() {
        TaskStatus::Successful => Ok(Some(task.result().cloned().unwrap_or(Value::Null))),
        TaskStatus::Failed => Err(TaskError::TaskFailed {
            task: task.friendly_name(),
            reason: task
                .result()
                .map(|reason| match reason {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_default(),
        }),
        _ => Ok(None),
    }
}
