//! Arena of task records and the edges between them.
//!
//! The graph owns every [`Task`]. Parent/subtask ownership and the
//! non-owning `depends_on` / `downstream` edges are stored as sets of
//! [`TaskKey`]s on the records, and every mutation of status, result or
//! edges goes through this type so the bidirectional invariants hold.
//!
//! The graph is not synchronized. A single driver is expected to
//! serialize agent actions against it.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::agent_resolver::AgentResolver;
use super::completion_tools::CompletionTool;
use super::defaults;
use super::dependency_resolver::DependencyResolver;
use super::execution_context::ExecutionContext;
use crate::domain::errors::{DomainResult, TaskError};
use crate::domain::models::{
    Agent, Parent, ResultTypeSummary, Task, TaskDefinition, TaskKey, TaskSnapshot, TaskStatus,
};
use crate::domain::ports::StatusObserver;

/// Reason recorded when a task exhausts its LLM call budget.
pub const MAX_LLM_CALLS_REASON: &str = "Max LLM calls reached for this task.";

/// A task and its subtasks, as returned by [`TaskGraph::hierarchy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskNode {
    pub key: TaskKey,
    pub id: String,
    pub children: Vec<TaskNode>,
}

#[derive(Default)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    observer: Option<Arc<dyn StatusObserver>>,
}

impl fmt::Debug for TaskGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskGraph")
            .field("tasks", &self.tasks.len())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notify `observer` of every status transition.
    pub fn with_observer(mut self, observer: Arc<dyn StatusObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn set_observer(&mut self, observer: Option<Arc<dyn StatusObserver>>) {
        self.observer = observer;
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = TaskKey> + '_ {
        self.tasks.iter().map(Task::key)
    }

    pub fn get(&self, key: TaskKey) -> Option<&Task> {
        self.tasks.get(key.0)
    }

    /// Like [`get`](Self::get), failing with [`TaskError::TaskNotFound`].
    pub fn task(&self, key: TaskKey) -> DomainResult<&Task> {
        self.get(key)
            .ok_or_else(|| TaskError::TaskNotFound(key.to_string()))
    }

    /// Mutable access to a task's descriptive fields. Status, result and
    /// edges stay behind the graph operations.
    pub fn task_mut(&mut self, key: TaskKey) -> DomainResult<&mut Task> {
        self.tasks
            .get_mut(key.0)
            .ok_or_else(|| TaskError::TaskNotFound(key.to_string()))
    }

    /// First task carrying fingerprint `id`.
    pub fn find_by_id(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id() == id)
    }

    /// Insert a task outside any execution context. `Parent::FromContext`
    /// resolves to no parent.
    pub fn insert(&mut self, definition: TaskDefinition) -> DomainResult<TaskKey> {
        self.insert_in(&ExecutionContext::default(), definition)
    }

    /// Insert a task, defaulting its parent to the innermost active task
    /// of `ctx`.
    pub fn insert_in(
        &mut self,
        ctx: &ExecutionContext,
        mut definition: TaskDefinition,
    ) -> DomainResult<TaskKey> {
        if definition.max_llm_calls.is_none() {
            definition.max_llm_calls = defaults::get().task_max_llm_calls;
        }
        definition.validate()?;

        let parent = match definition.parent {
            Parent::FromContext => ctx.current_task(),
            Parent::Root => None,
            Parent::Of(key) => Some(key),
        };
        if let Some(parent) = parent {
            self.task(parent)?;
        }
        for dependency in &definition.depends_on {
            self.task(*dependency)?;
        }

        let key = TaskKey(self.tasks.len());
        let depends_on = std::mem::take(&mut definition.depends_on);
        let task = Task::from_definition(key, definition);

        if let Some(existing) = self.find_by_id(task.id()) {
            warn!(
                task_id = %task.id(),
                existing = %existing.key(),
                new = %key,
                "fingerprint collision; tasks remain distinct in the graph"
            );
        }
        debug!(task_id = %task.id(), key = %key, "task inserted");
        self.tasks.push(task);

        for dependency in depends_on {
            self.add_dependency(key, dependency)?;
        }
        if let Some(parent) = parent {
            self.add_subtask(parent, key)?;
        }
        Ok(key)
    }

    /// Make `child` a subtask of `parent`. The parent implicitly depends
    /// on it. Fails if `child` already has a different parent.
    pub fn add_subtask(&mut self, parent: TaskKey, child: TaskKey) -> DomainResult<()> {
        self.task(parent)?;
        let current = self.task(child)?.parent;
        match current {
            Some(existing) if existing != parent => {
                return Err(TaskError::AlreadyHasParent {
                    task: self.tasks[child.0].friendly_name(),
                });
            }
            Some(_) => {}
            None => self.tasks[child.0].parent = Some(parent),
        }
        self.tasks[parent.0].subtasks.insert(child);
        debug!(parent = %parent, child = %child, "subtask added");
        self.add_dependency(parent, child)
    }

    /// Record that `task` depends on `dependency`. Adding an existing edge
    /// is a no-op. Cycles are not rejected.
    pub fn add_dependency(&mut self, task: TaskKey, dependency: TaskKey) -> DomainResult<()> {
        self.task(task)?;
        self.task(dependency)?;
        if self.tasks[task.0].depends_on.insert(dependency) {
            debug!(task = %task, dependency = %dependency, "dependency added");
        }
        self.tasks[dependency.0].downstream.insert(task);
        Ok(())
    }

    /// Incomplete, with every dependency complete. Failed and skipped
    /// dependencies count as complete.
    pub fn is_ready(&self, key: TaskKey) -> DomainResult<bool> {
        let task = self.task(key)?;
        Ok(task.is_incomplete()
            && task
                .depends_on
                .iter()
                .all(|dep| self.tasks[dep.0].is_complete()))
    }

    /// Subtasks of `key` ordered by creation time.
    pub fn subtasks(&self, key: TaskKey) -> DomainResult<Vec<TaskKey>> {
        let mut subtasks: Vec<TaskKey> = self.task(key)?.subtasks.iter().copied().collect();
        subtasks.sort_by_key(|k| (self.tasks[k.0].created_at(), *k));
        Ok(subtasks)
    }

    pub fn mark_running(&mut self, key: TaskKey) -> DomainResult<()> {
        self.transition(key, TaskStatus::Running, None)
    }

    /// Validate `raw` and store it. On a validation error nothing changes.
    pub fn mark_successful(&mut self, key: TaskKey, raw: Value) -> DomainResult<()> {
        let result = self.task(key)?.validate_result(raw)?;
        self.transition(key, TaskStatus::Successful, Some(result))
    }

    /// Store `reason` as the result without validation.
    pub fn mark_failed(&mut self, key: TaskKey, reason: impl Into<String>) -> DomainResult<()> {
        self.transition(key, TaskStatus::Failed, Some(Value::String(reason.into())))
    }

    pub fn mark_skipped(&mut self, key: TaskKey) -> DomainResult<()> {
        self.transition(key, TaskStatus::Skipped, None)
    }

    fn transition(
        &mut self,
        key: TaskKey,
        status: TaskStatus,
        result: Option<Value>,
    ) -> DomainResult<()> {
        let task = self.task_mut(key)?;
        if result.is_some() {
            task.set_result(result);
        }
        let previous = task.set_status(status);
        info!(
            task_id = %task.id(),
            from = %previous,
            to = %status,
            "task status changed"
        );
        if let Some(observer) = self.observer.clone() {
            observer.task_updated(&self.snapshot(key)?);
        }
        Ok(())
    }

    /// Charge one LLM call against the task's budget. When the budget is
    /// already spent the task is marked failed and `false` is returned.
    pub fn charge_llm_call(&mut self, key: TaskKey) -> DomainResult<bool> {
        let task = self.task(key)?;
        let exhausted = matches!(task.max_llm_calls(), Some(max) if task.llm_calls() >= max);
        if exhausted {
            self.mark_failed(key, MAX_LLM_CALLS_REASON)?;
            return Ok(false);
        }
        self.task_mut(key)?.increment_llm_calls();
        Ok(true)
    }

    /// Replace the explicitly assigned agents of `key`. `None` defers to
    /// the parent chain; an empty list is rejected.
    pub fn set_agents(&mut self, key: TaskKey, agents: Option<Vec<Agent>>) -> DomainResult<()> {
        if matches!(&agents, Some(agents) if agents.is_empty()) {
            return Err(TaskError::EmptyAgents);
        }
        self.task_mut(key)?.set_agents(agents);
        Ok(())
    }

    /// Replace the LLM call budget of `key`. Zero is rejected; `None`
    /// removes the limit.
    pub fn set_max_llm_calls(&mut self, key: TaskKey, max: Option<u32>) -> DomainResult<()> {
        if max == Some(0) {
            return Err(TaskError::ZeroLlmCallBudget);
        }
        self.task_mut(key)?.set_max_llm_calls(max);
        Ok(())
    }

    /// Restrict which agents may complete `key`; `None` allows any.
    pub fn set_completion_agents(
        &mut self,
        key: TaskKey,
        agents: Option<Vec<Agent>>,
    ) -> DomainResult<()> {
        self.task_mut(key)?.set_completion_agents(agents);
        Ok(())
    }

    /// The agents that may work `key`, resolved through the parent chain,
    /// the flow of `ctx` and the process default.
    pub fn get_agents(&self, key: TaskKey, ctx: &ExecutionContext) -> DomainResult<Vec<Agent>> {
        AgentResolver::new(self, ctx.flow()).resolve(key)
    }

    /// Success and failure tools for `key`, or none when `agent` is not
    /// allowed to complete the task.
    pub fn completion_tools(
        &self,
        key: TaskKey,
        agent: Option<&Agent>,
    ) -> DomainResult<Vec<CompletionTool>> {
        if !self.task(key)?.can_be_completed_by(agent) {
            return Ok(Vec::new());
        }
        Ok(vec![
            CompletionTool::success(self, key)?,
            CompletionTool::failure(self, key)?,
        ])
    }

    /// Roots, their subtasks and dependencies transitively, and the
    /// ready subset, both in discovery order.
    fn collect(&self, roots: &[TaskKey]) -> (Vec<TaskKey>, Vec<TaskKey>) {
        let mut seen = BTreeSet::new();
        let mut all = Vec::new();
        let mut ready = Vec::new();
        for &root in roots {
            self.collect_from(root, &mut seen, &mut all, &mut ready);
        }
        (all, ready)
    }

    fn collect_from(
        &self,
        key: TaskKey,
        seen: &mut BTreeSet<TaskKey>,
        all: &mut Vec<TaskKey>,
        ready: &mut Vec<TaskKey>,
    ) {
        let Some(task) = self.get(key) else {
            return;
        };
        if !seen.insert(key) {
            return;
        }
        all.push(key);
        for &subtask in &task.subtasks {
            self.collect_from(subtask, seen, all, ready);
        }
        for &dependency in &task.depends_on {
            self.collect_from(dependency, seen, all, ready);
        }
        if self.is_ready(key).unwrap_or(false) {
            ready.push(key);
        }
    }

    /// Tasks reachable from `roots` that are ready to work.
    pub fn ready_tasks(&self, roots: &[TaskKey]) -> Vec<TaskKey> {
        self.collect(roots).1
    }

    /// Tasks reachable from `roots` plus the ancestors of each root.
    pub fn all_tasks(&self, roots: &[TaskKey]) -> Vec<TaskKey> {
        let (mut all, _) = self.collect(roots);
        let mut seen: BTreeSet<TaskKey> = all.iter().copied().collect();
        for &root in roots {
            let mut current = self.get(root).and_then(Task::parent);
            while let Some(parent) = current {
                if !seen.insert(parent) {
                    break;
                }
                all.push(parent);
                current = self.tasks[parent.0].parent;
            }
        }
        all
    }

    /// Ready tasks reachable from `roots` that `agent` may work.
    pub fn assigned_tasks(
        &self,
        roots: &[TaskKey],
        agent: &Agent,
        ctx: &ExecutionContext,
    ) -> DomainResult<Vec<TaskKey>> {
        let mut assigned = Vec::new();
        for key in self.ready_tasks(roots) {
            if self.get_agents(key, ctx)?.contains(agent) {
                assigned.push(key);
            }
        }
        Ok(assigned)
    }

    /// Each agent able to work a ready task, with those tasks, in order
    /// of first appearance.
    pub fn available_agents(
        &self,
        roots: &[TaskKey],
        ctx: &ExecutionContext,
    ) -> DomainResult<Vec<(Agent, Vec<TaskKey>)>> {
        let mut available: Vec<(Agent, Vec<TaskKey>)> = Vec::new();
        for key in self.ready_tasks(roots) {
            for agent in self.get_agents(key, ctx)? {
                match available.iter_mut().find(|(a, _)| *a == agent) {
                    Some((_, tasks)) => tasks.push(key),
                    None => available.push((agent, vec![key])),
                }
            }
        }
        Ok(available)
    }

    /// Parent/child tree over [`all_tasks`](Self::all_tasks).
    pub fn hierarchy(&self, roots: &[TaskKey]) -> Vec<TaskNode> {
        let all = self.all_tasks(roots);
        let members: BTreeSet<TaskKey> = all.iter().copied().collect();
        let mut children: HashMap<TaskKey, Vec<TaskKey>> = HashMap::new();
        let mut tops = Vec::new();
        for &key in &all {
            match self.tasks[key.0].parent {
                Some(parent) if members.contains(&parent) => {
                    children.entry(parent).or_default().push(key);
                }
                _ => tops.push(key),
            }
        }
        let mut visited = BTreeSet::new();
        tops.into_iter()
            .filter_map(|key| self.build_node(key, &children, &mut visited))
            .collect()
    }

    fn build_node(
        &self,
        key: TaskKey,
        children: &HashMap<TaskKey, Vec<TaskKey>>,
        visited: &mut BTreeSet<TaskKey>,
    ) -> Option<TaskNode> {
        if !visited.insert(key) {
            return None;
        }
        let kids = children
            .get(&key)
            .map(|kids| {
                kids.iter()
                    .filter_map(|&kid| self.build_node(kid, children, visited))
                    .collect()
            })
            .unwrap_or_default();
        Some(TaskNode {
            key,
            id: self.tasks[key.0].id().to_string(),
            children: kids,
        })
    }

    /// A dependency cycle, if one exists. Never enforced on insertion.
    pub fn find_cycle(&self) -> Option<Vec<TaskKey>> {
        DependencyResolver::new().detect_cycle(self)
    }

    /// Prompt-safe view of a task outside any flow.
    pub fn snapshot(&self, key: TaskKey) -> DomainResult<TaskSnapshot> {
        self.snapshot_in(key, &ExecutionContext::default())
    }

    pub fn snapshot_in(&self, key: TaskKey, ctx: &ExecutionContext) -> DomainResult<TaskSnapshot> {
        let task = self.task(key)?;
        let ids = |keys: &BTreeSet<TaskKey>| {
            keys.iter()
                .map(|k| self.tasks[k.0].id().to_string())
                .collect::<Vec<_>>()
        };
        let result_type = task.result_type.schema().map(|schema| ResultTypeSummary {
            kind: task.result_type.descriptor(),
            schema,
        });
        Ok(TaskSnapshot {
            id: task.id().to_string(),
            name: task.name.clone(),
            objective: task.objective.clone(),
            instructions: task.instructions.clone(),
            status: task.status(),
            context: task.context.clone(),
            result: task.result().cloned(),
            result_type,
            parent: task.parent.map(|p| self.tasks[p.0].id().to_string()),
            depends_on: ids(&task.depends_on),
            subtasks: self
                .subtasks(key)?
                .into_iter()
                .map(|k| self.tasks[k.0].id().to_string())
                .collect(),
            agents: self
                .get_agents(key, ctx)?
                .iter()
                .map(Agent::serialize_for_prompt)
                .collect(),
            completion_agents: task
                .completion_agents()
                .map(|agents| agents.iter().map(Agent::serialize_for_prompt).collect()),
            tools: task.get_tools().iter().map(|tool| tool.summary()).collect(),
            interactive: task.interactive,
            llm_calls: task.llm_calls(),
            max_llm_calls: task.max_llm_calls(),
            created_at: task.created_at(),
        })
    }

    /// Compact JSON representation for prompts.
    pub fn serialize_for_prompt(&self, key: TaskKey) -> DomainResult<String> {
        Ok(self.snapshot(key)?.to_prompt_json())
    }

    /// Overwrite status, result and call count when loading a persisted
    /// graph. No validation and no observer notification.
    pub(crate) fn restore_state(
        &mut self,
        key: TaskKey,
        status: TaskStatus,
        result: Option<Value>,
        llm_calls: u32,
    ) -> DomainResult<()> {
        let task = self.task_mut(key)?;
        task.set_status(status);
        task.set_result(result);
        task.set_llm_calls(llm_calls);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Flow, Shape};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, TaskStatus)>>);

    impl StatusObserver for Recorder {
        fn task_updated(&self, task: &TaskSnapshot) {
            self.0.lock().unwrap().push((task.id.clone(), task.status));
        }
    }

    #[test]
    fn test_insert_with_context_parent() {
        let mut graph = TaskGraph::new();
        let parent = graph.insert(TaskDefinition::new("parent")).unwrap();

        let mut ctx = ExecutionContext::new();
        let child = ctx.with_task(parent, |ctx| {
            graph.insert_in(ctx, TaskDefinition::new("child")).unwrap()
        });
        let orphan = graph.insert_in(&ctx, TaskDefinition::new("orphan")).unwrap();

        assert_eq!(graph.task(child).unwrap().parent(), Some(parent));
        assert!(graph.task(parent).unwrap().subtask_keys().contains(&child));
        assert!(graph.task(parent).unwrap().depends_on().contains(&child));
        assert!(graph.task(child).unwrap().downstream().contains(&parent));
        assert_eq!(graph.task(orphan).unwrap().parent(), None);
    }

    #[test]
    fn test_as_root_ignores_context() {
        let mut graph = TaskGraph::new();
        let parent = graph.insert(TaskDefinition::new("parent")).unwrap();
        let mut ctx = ExecutionContext::new();
        ctx.enter(parent);
        let root = graph
            .insert_in(&ctx, TaskDefinition::new("root").as_root())
            .unwrap();
        assert_eq!(graph.task(root).unwrap().parent(), None);
    }

    #[test]
    fn test_reparenting_fails() {
        let mut graph = TaskGraph::new();
        let a = graph.insert(TaskDefinition::new("a")).unwrap();
        let b = graph.insert(TaskDefinition::new("b")).unwrap();
        let child = graph.insert(TaskDefinition::new("child")).unwrap();

        graph.add_subtask(a, child).unwrap();
        graph.add_subtask(a, child).unwrap();
        let err = graph.add_subtask(b, child).unwrap_err();
        assert!(matches!(err, TaskError::AlreadyHasParent { .. }));
        assert!(err.to_string().contains("child"));
        assert!(graph.task(b).unwrap().subtask_keys().is_empty());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let mut graph = TaskGraph::new();
        let err = graph
            .insert(TaskDefinition::new("x").with_dependency(TaskKey(7)))
            .unwrap_err();
        assert!(matches!(err, TaskError::TaskNotFound(_)));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_readiness_follows_dependencies() {
        let mut graph = TaskGraph::new();
        let b = graph.insert(TaskDefinition::new("b")).unwrap();
        let a = graph
            .insert(TaskDefinition::new("a").with_dependency(b))
            .unwrap();

        assert!(!graph.is_ready(a).unwrap());
        assert!(graph.is_ready(b).unwrap());
        graph.mark_skipped(b).unwrap();
        assert!(graph.is_ready(a).unwrap());
        assert!(!graph.is_ready(b).unwrap());
    }

    #[test]
    fn test_validation_failure_keeps_state() {
        let mut graph = TaskGraph::new();
        let key = graph
            .insert(TaskDefinition::new("count").with_result_type(Shape::Integer))
            .unwrap();
        graph.mark_running(key).unwrap();

        assert!(graph.mark_successful(key, json!("many")).is_err());
        assert_eq!(graph.task(key).unwrap().status(), TaskStatus::Running);
        assert!(graph.task(key).unwrap().result().is_none());

        graph.mark_successful(key, json!("3")).unwrap();
        assert_eq!(graph.task(key).unwrap().result(), Some(&json!(3)));
    }

    #[test]
    fn test_mark_failed_stores_reason() {
        let mut graph = TaskGraph::new();
        let key = graph.insert(TaskDefinition::new("x")).unwrap();
        graph.mark_failed(key, "network down").unwrap();
        assert_eq!(graph.task(key).unwrap().failure_reason(), Some("network down"));
    }

    #[test]
    fn test_observer_sees_every_transition() {
        let recorder = Arc::new(Recorder::default());
        let mut graph = TaskGraph::new().with_observer(recorder.clone());
        let key = graph.insert(TaskDefinition::new("x")).unwrap();
        graph.mark_running(key).unwrap();
        graph.mark_successful(key, json!("done")).unwrap();
        graph.mark_skipped(key).unwrap();

        let statuses: Vec<_> = recorder.0.lock().unwrap().iter().map(|(_, s)| *s).collect();
        assert_eq!(
            statuses,
            vec![TaskStatus::Running, TaskStatus::Successful, TaskStatus::Skipped]
        );
    }

    #[test]
    fn test_llm_call_budget() {
        let mut graph = TaskGraph::new();
        let key = graph
            .insert(TaskDefinition::new("x").with_max_llm_calls(2))
            .unwrap();
        assert!(graph.charge_llm_call(key).unwrap());
        assert!(graph.charge_llm_call(key).unwrap());
        assert!(!graph.charge_llm_call(key).unwrap());

        let task = graph.task(key).unwrap();
        assert_eq!(task.llm_calls(), 2);
        assert_eq!(task.failure_reason(), Some(MAX_LLM_CALLS_REASON));
    }

    #[test]
    fn test_subtasks_in_creation_order() {
        let mut graph = TaskGraph::new();
        let parent = graph.insert(TaskDefinition::new("parent")).unwrap();
        let first = graph
            .insert(TaskDefinition::new("first").with_parent(parent))
            .unwrap();
        let second = graph
            .insert(TaskDefinition::new("second").with_parent(parent))
            .unwrap();
        assert_eq!(graph.subtasks(parent).unwrap(), vec![first, second]);
    }

    #[test]
    fn test_ready_and_all_tasks() {
        let mut graph = TaskGraph::new();
        let grandparent = graph.insert(TaskDefinition::new("gp")).unwrap();
        let root = graph
            .insert(TaskDefinition::new("root").with_parent(grandparent))
            .unwrap();
        let dep = graph.insert(TaskDefinition::new("dep")).unwrap();
        let sub = graph
            .insert(TaskDefinition::new("sub").with_parent(root))
            .unwrap();
        graph.add_dependency(root, dep).unwrap();

        let ready = graph.ready_tasks(&[root]);
        assert_eq!(ready, vec![sub, dep]);

        let all = graph.all_tasks(&[root]);
        assert!(all.contains(&grandparent));
        assert_eq!(all.len(), 4);

        let tree = graph.hierarchy(&[root]);
        assert_eq!(tree.len(), 2);
        let top = tree.iter().find(|node| node.key == grandparent).unwrap();
        assert_eq!(top.children[0].key, root);
        assert_eq!(top.children[0].children[0].key, sub);
        assert!(tree.iter().any(|node| node.key == dep && node.children.is_empty()));
    }

    #[test]
    fn test_available_agents_groups_tasks() {
        let writer = Agent::new("writer");
        let editor = Agent::new("editor");
        let mut graph = TaskGraph::new();
        let a = graph
            .insert(TaskDefinition::new("a").with_agents(vec![writer.clone()]))
            .unwrap();
        let b = graph
            .insert(TaskDefinition::new("b").with_agents(vec![writer.clone(), editor.clone()]))
            .unwrap();

        let ctx = ExecutionContext::new();
        let available = graph.available_agents(&[a, b], &ctx).unwrap();
        assert_eq!(available.len(), 2);
        assert_eq!(available[0], (writer.clone(), vec![a, b]));
        assert_eq!(available[1], (editor.clone(), vec![b]));
        assert_eq!(graph.assigned_tasks(&[a, b], &editor, &ctx).unwrap(), vec![b]);
    }

    #[test]
    fn test_snapshot_uses_ids_and_flow_agent() {
        let mut graph = TaskGraph::new();
        let dep = graph.insert(TaskDefinition::new("dep")).unwrap();
        let key = graph
            .insert(
                TaskDefinition::new("main")
                    .with_dependency(dep)
                    .with_context("topic", "rust"),
            )
            .unwrap();

        let ctx = ExecutionContext::new()
            .with_flow(Flow::new("docs").with_default_agent(Agent::new("Scribe")));
        let snapshot = graph.snapshot_in(key, &ctx).unwrap();
        assert_eq!(snapshot.depends_on, vec![graph.task(dep).unwrap().id().to_string()]);
        assert_eq!(snapshot.agents[0].name, "Scribe");
        assert_eq!(snapshot.context["topic"], "rust");
        assert_eq!(snapshot.result_type.unwrap().kind, "str");

        let prompt: Value = serde_json::from_str(&graph.serialize_for_prompt(key).unwrap()).unwrap();
        assert_eq!(prompt["status"], "PENDING");
    }

    #[test]
    fn test_restore_state() {
        let mut graph = TaskGraph::new();
        let key = graph.insert(TaskDefinition::new("x")).unwrap();
        graph
            .restore_state(key, TaskStatus::Successful, Some(json!("ok")), 3)
            .unwrap();
        let task = graph.task(key).unwrap();
        assert!(task.is_successful());
        assert_eq!(task.llm_calls(), 3);

        graph.restore_state(key, TaskStatus::Pending, None, 1).unwrap();
        assert_eq!(graph.task(key).unwrap().llm_calls(), 1);
    }

    #[test]
    fn test_set_agents_rejects_empty_list() {
        let writer = Agent::new("writer");
        let mut graph = TaskGraph::new();
        let key = graph
            .insert(TaskDefinition::new("x").with_agents(vec![writer.clone()]))
            .unwrap();
        let ctx = ExecutionContext::new();

        assert!(matches!(
            graph.set_agents(key, Some(vec![])),
            Err(TaskError::EmptyAgents)
        ));
        assert_eq!(graph.get_agents(key, &ctx).unwrap(), vec![writer]);

        let editor = Agent::new("editor");
        graph.set_agents(key, Some(vec![editor.clone()])).unwrap();
        assert_eq!(graph.get_agents(key, &ctx).unwrap(), vec![editor]);

        graph.set_agents(key, None).unwrap();
        assert_eq!(graph.get_agents(key, &ctx).unwrap(), vec![defaults::agent()]);
    }

    #[test]
    fn test_zero_llm_call_budget_is_rejected_on_insert() {
        let mut graph = TaskGraph::new();
        assert!(matches!(
            graph.insert(TaskDefinition::new("x").with_max_llm_calls(0)),
            Err(TaskError::ZeroLlmCallBudget)
        ));
        assert!(graph.is_empty());

        let key = graph
            .insert(TaskDefinition::new("x").with_max_llm_calls(3))
            .unwrap();
        assert!(matches!(
            graph.set_max_llm_calls(key, Some(0)),
            Err(TaskError::ZeroLlmCallBudget)
        ));
        assert_eq!(graph.task(key).unwrap().max_llm_calls(), Some(3));
        graph.set_max_llm_calls(key, None).unwrap();
        assert!(graph.charge_llm_call(key).unwrap());
    }
}
