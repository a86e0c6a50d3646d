//! Default prompt rendering for tasks.

use serde_json::Value;

use super::execution_context::ExecutionContext;
use super::task_graph::TaskGraph;
use crate::domain::errors::DomainResult;
use crate::domain::models::{TaskKey, TaskSnapshot};
use crate::domain::ports::PromptRenderer;

const DEFAULT_TASK_TEMPLATE: &str = "\
## Task {id}

- Objective: {objective}
- Status: {status}

### Instructions

{instructions}

### Context

{context}
";

/// Renders tasks as markdown, substituting `{id}`, `{objective}`,
/// `{instructions}`, `{context}` and `{status}` placeholders.
#[derive(Debug, Clone, Default)]
pub struct MarkdownTaskRenderer;

impl MarkdownTaskRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl PromptRenderer for MarkdownTaskRenderer {
    fn render_task(&self, task: &TaskSnapshot, template: Option<&str>) -> String {
        let context = if task.context.is_empty() {
            "(none)".to_string()
        } else {
            serde_json::to_string_pretty(&Value::Object(task.context.clone())).unwrap_or_default()
        };
        let values: [(&str, &str); 5] = [
            ("id", &task.id),
            ("objective", &task.objective),
            ("instructions", task.instructions.as_deref().unwrap_or("(none)")),
            ("context", &context),
            ("status", task.status.as_str()),
        ];
        substitute(template.unwrap_or(DEFAULT_TASK_TEMPLATE), &values)
    }
}

/// Replaces each `{name}` in `template` in one pass. Substituted text is
/// never rescanned and unknown placeholders are kept as written.
fn substitute(template: &str, values: &[(&str, &str)]) -> String {
    let lookup = |name: &str| values.iter().find(|(key, _)| *key == name).map(|(_, v)| *v);
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let replaced = tail
            .find('}')
            .and_then(|close| lookup(&tail[1..close]).map(|text| (text, close)));
        match replaced {
            Some((text, close)) => {
                out.push_str(text);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Prompt text for `key`, honoring the task's own template override.
pub fn task_prompt(
    graph: &TaskGraph,
    key: TaskKey,
    ctx: &ExecutionContext,
    renderer: &dyn PromptRenderer,
) -> DomainResult<String> {
    let task = graph.task(key)?;
    let snapshot = graph.snapshot_in(key, ctx)?;
    Ok(renderer.render_task(&snapshot, task.prompt.as_deref()))
}
