//! Orchestrator port.
//!
//! The orchestrator decides which ready task and agent act next, drives
//! agents through their turns, and enforces turn and call budgets. This
//! crate only defines the contract; implementations live with the LLM
//! integration.

use async_trait::async_trait;

use crate::domain::models::{Agent, Flow, TaskKey};
use crate::services::TaskGraph;

/// Budgets and agent selection for one orchestration session.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Agent to start with; the orchestrator picks one when unset
    pub agent: Option<Agent>,
    /// Flow whose default agent applies to unassigned tasks
    pub flow: Option<Flow>,
    /// Maximum LLM calls for the session
    pub max_llm_calls: Option<u32>,
    /// Maximum agent turns for the session
    pub max_agent_turns: Option<u32>,
}

impl RunOptions {
    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn with_flow(mut self, flow: Flow) -> Self {
        self.flow = Some(flow);
        self
    }

    pub fn with_max_llm_calls(mut self, max: u32) -> Self {
        self.max_llm_calls = Some(max);
        self
    }

    pub fn with_max_agent_turns(mut self, max: u32) -> Self {
        self.max_agent_turns = Some(max);
        self
    }
}

/// Drives tasks toward completion.
///
/// Implementations advance `tasks` and whatever their readiness requires.
/// Returning `Ok(())` with tasks still incomplete is allowed (budget
/// exhausted); errors are reserved for failures of the driver itself.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    async fn run_tasks(
        &self,
        graph: &mut TaskGraph,
        tasks: &[TaskKey],
        options: &RunOptions,
    ) -> anyhow::Result<()>;
}
