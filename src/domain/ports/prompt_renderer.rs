use crate::domain::models::TaskSnapshot;

/// Turns a task into the prompt text an agent reads.
pub trait PromptRenderer: Send + Sync {
    /// Render `task`, using `template` when the task overrides the default.
    fn render_task(&self, task: &TaskSnapshot, template: Option<&str>) -> String;
}
