//! Common test utilities for integration tests
//!
//! Shared fixtures and a scripted orchestrator used across the
//! integration test files.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use taskweave::domain::models::TaskKey;
use taskweave::domain::ports::{Orchestrator, RunOptions};
use taskweave::services::TaskGraph;
use tempfile::TempDir;

/// Create a temporary directory for test isolation
#[allow(dead_code)]
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// One scripted agent action: the suffix of a completion tool name and
/// its arguments, e.g. `("successful", json!({"result": 3}))`.
pub type Step = (&'static str, Value);

/// Orchestrator that plays back completion tool calls, one per LLM call,
/// against the first requested task, the way an agent would.
#[allow(dead_code)]
pub struct ScriptedOrchestrator {
    steps: Mutex<VecDeque<Step>>,
    transcript: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedOrchestrator {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            transcript: Mutex::new(Vec::new()),
        }
    }

    /// Tool outputs and rejection messages, in call order
    pub fn transcript(&self) -> Vec<String> {
        self.transcript.lock().unwrap().clone()
    }
}

#[async_trait]
impl Orchestrator for ScriptedOrchestrator {
    async fn run_tasks(
        &self,
        graph: &mut TaskGraph,
        tasks: &[TaskKey],
        options: &RunOptions,
    ) -> anyhow::Result<()> {
        let key = tasks[0];
        graph.mark_running(key)?;

        let mut calls = 0;
        while graph.task(key)?.is_incomplete() {
            if options.max_llm_calls.is_some_and(|max| calls >= max) {
                break;
            }
            let Some((suffix, args)) = self.steps.lock().unwrap().pop_front() else {
                break;
            };
            calls += 1;
            if !graph.charge_llm_call(key)? {
                break;
            }
            let tool = graph
                .completion_tools(key, options.agent.as_ref())?
                .into_iter()
                .find(|tool| tool.name.ends_with(suffix))
                .ok_or_else(|| anyhow::anyhow!("no tool ending in {suffix}"))?;
            let message = match tool.invoke(graph, args) {
                Ok(message) => message,
                Err(e) => e.agent_message(),
            };
            self.transcript.lock().unwrap().push(message);
        }
        Ok(())
    }
}
