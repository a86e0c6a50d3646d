use std::collections::{BTreeMap, BTreeSet};

use super::task_graph::TaskGraph;
use crate::domain::models::TaskKey;

/// Diagnostics over the dependency edges of a [`TaskGraph`]
///
/// The graph never rejects a cycle when an edge is added; orchestrators
/// use these checks to detect the tasks that can never become ready.
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleError {
    #[error("Circular dependency detected: {}", render_path(.0))]
    Cycle(Vec<TaskKey>),
}

fn render_path(path: &[TaskKey]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn detect_cycle_util(
    node: TaskKey,
    graph: &TaskGraph,
    visited: &mut BTreeSet<TaskKey>,
    rec_stack: &mut BTreeSet<TaskKey>,
    path: &mut Vec<TaskKey>,
) -> bool {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(task) = graph.get(node) {
        for &neighbor in task.depends_on() {
            if !visited.contains(&neighbor) {
                if detect_cycle_util(neighbor, graph, visited, rec_stack, path) {
                    return true;
                }
            } else if rec_stack.contains(&neighbor) {
                if let Some(cycle_start) = path.iter().position(|&key| key == neighbor) {
                    path.drain(0..cycle_start);
                    return true;
                }
            }
        }
    }

    rec_stack.remove(&node);
    path.pop();
    false
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self
    }

    /// A dependency cycle, starting from the first task on it that the
    /// search reached.
    pub fn detect_cycle(&self, graph: &TaskGraph) -> Option<Vec<TaskKey>> {
        let mut visited = BTreeSet::new();
        let mut rec_stack = BTreeSet::new();
        let mut path = Vec::new();

        for key in graph.keys() {
            if !visited.contains(&key)
                && detect_cycle_util(key, graph, &mut visited, &mut rec_stack, &mut path)
            {
                return Some(path);
            }
        }
        None
    }

    /// Every task, dependencies before the tasks that need them.
    pub fn topological_order(&self, graph: &TaskGraph) -> Result<Vec<TaskKey>, CycleError> {
        if let Some(cycle) = self.detect_cycle(graph) {
            return Err(CycleError::Cycle(cycle));
        }

        let mut in_degree: BTreeMap<TaskKey, usize> = graph
            .iter()
            .map(|task| (task.key(), task.depends_on().len()))
            .collect();

        // Kahn's algorithm; the ordered queue keeps ties in insertion order
        let mut queue: BTreeSet<TaskKey> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&key, _)| key)
            .collect();
        let mut sorted = Vec::with_capacity(graph.len());

        while let Some(key) = queue.pop_first() {
            sorted.push(key);
            for &dependent in graph.get(key).map(|t| t.downstream()).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(&dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.insert(dependent);
                    }
                }
            }
        }

        if sorted.len() != graph.len() {
            return Err(CycleError::Cycle(
                in_degree
                    .into_iter()
                    .filter(|&(_, degree)| degree > 0)
                    .map(|(key, _)| key)
                    .collect(),
            ));
        }
        Ok(sorted)
    }

    /// Length of the longest dependency chain below `key`; zero for a task
    /// without dependencies.
    pub fn depth(&self, graph: &TaskGraph, key: TaskKey) -> Result<u32, CycleError> {
        let mut visiting = Vec::new();
        depth_recursive(graph, key, &mut visiting)
    }
}

fn depth_recursive(
    graph: &TaskGraph,
    key: TaskKey,
    visiting: &mut Vec<TaskKey>,
) -> Result<u32, CycleError> {
    if let Some(start) = visiting.iter().position(|&k| k == key) {
        return Err(CycleError::Cycle(visiting[start..].to_vec()));
    }
    let Some(task) = graph.get(key) else {
        return Ok(0);
    };

    visiting.push(key);
    let mut max_depth = 0;
    for &dependency in task.depends_on() {
        max_depth = max_depth.max(depth_recursive(graph, dependency, visiting)? + 1);
    }
    visiting.pop();
    Ok(max_depth)
}
