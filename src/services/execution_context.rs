//! Explicit execution context.
//!
//! Tracks the stack of tasks currently being worked (the innermost one is
//! the default parent for tasks created inside it) and the flow, if any,
//! whose default agent applies.

use crate::domain::models::{Flow, TaskKey};

#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    tasks: Vec<TaskKey>,
    flow: Option<Flow>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flow(mut self, flow: Flow) -> Self {
        self.flow = Some(flow);
        self
    }

    pub fn flow(&self) -> Option<&Flow> {
        self.flow.as_ref()
    }

    /// Innermost active task.
    pub fn current_task(&self) -> Option<TaskKey> {
        self.tasks.last().copied()
    }

    /// Active tasks, outermost first.
    pub fn active_tasks(&self) -> &[TaskKey] {
        &self.tasks
    }

    /// Push a task onto the stack. The same task may be entered more than once.
    pub fn enter(&mut self, task: TaskKey) {
        self.tasks.push(task);
    }

    /// Pop the innermost task.
    pub fn exit(&mut self) -> Option<TaskKey> {
        self.tasks.pop()
    }

    /// Run `f` with `task` active, restoring the stack afterwards.
    pub fn with_task<R>(&mut self, task: TaskKey, f: impl FnOnce(&mut Self) -> R) -> R {
        let depth = self.tasks.len();
        self.enter(task);
        let result = f(self);
        self.tasks.truncate(depth);
        result
    }
}
