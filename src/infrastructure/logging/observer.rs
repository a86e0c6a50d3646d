use tracing::info;

use crate::domain::models::TaskSnapshot;
use crate::domain::ports::StatusObserver;

/// Status observer that writes each transition to the log.
#[derive(Debug, Clone, Default)]
pub struct TracingObserver;

impl StatusObserver for TracingObserver {
    fn task_updated(&self, task: &TaskSnapshot) {
        info!(
            target: "taskweave::status",
            task_id = %task.id,
            name = task.name.as_deref().unwrap_or(""),
            status = %task.status,
            llm_calls = task.llm_calls,
            "task updated"
        );
    }
}
