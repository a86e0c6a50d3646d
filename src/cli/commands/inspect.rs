//! `taskweave inspect`: list the tasks of a graph file.

use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::cli::types::InspectArgs;
use crate::domain::models::{TaskSnapshot, TaskStatus};
use crate::infrastructure::graph_file::{GraphFile, LoadedGraph};

/// One task as shown in the inspect table
#[derive(Debug, Clone, Serialize)]
pub struct TaskRow {
    pub key: String,
    pub id: String,
    pub name: Option<String>,
    pub objective: String,
    pub status: TaskStatus,
    pub ready: bool,
    pub parent: Option<String>,
    pub depends_on: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub name: Option<String>,
    #[serde(skip)]
    pub rows: Vec<TaskRow>,
    pub tasks: Vec<KeyedSnapshot>,
    /// File keys of a dependency cycle, if the graph has one
    pub cycle: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct KeyedSnapshot {
    pub key: String,
    pub ready: bool,
    #[serde(flatten)]
    pub snapshot: TaskSnapshot,
}

impl CommandOutput for InspectOutput {
    fn to_human(&self) -> String {
        let mut out = String::new();
        if let Some(name) = &self.name {
            out.push_str(&format!("Graph: {name}\n"));
        }
        out.push_str(&TableFormatter::new().format_tasks(&self.rows));
        let ready = self.rows.iter().filter(|r| r.ready).count();
        out.push_str(&format!("\n{} tasks, {ready} ready", self.rows.len()));
        if let Some(cycle) = &self.cycle {
            out.push_str(&format!(
                "\nWarning: dependency cycle {}; these tasks can never become ready",
                cycle.join(" -> ")
            ));
        }
        out
    }
}

fn file_key(loaded: &LoadedGraph, key: crate::domain::models::TaskKey) -> String {
    loaded
        .name_of(key)
        .map_or_else(|| key.to_string(), str::to_string)
}

pub fn inspect(loaded: &LoadedGraph) -> Result<InspectOutput> {
    let graph = &loaded.graph;
    let mut rows = Vec::with_capacity(graph.len());
    let mut tasks = Vec::with_capacity(graph.len());

    for (name, key) in loaded.keys() {
        let task = graph.task(key)?;
        let ready = graph.is_ready(key)?;
        rows.push(TaskRow {
            key: name.to_string(),
            id: task.id().to_string(),
            name: task.name.clone(),
            objective: task.objective.clone(),
            status: task.status(),
            ready,
            parent: task.parent().map(|p| file_key(loaded, p)),
            depends_on: task.depends_on().iter().map(|&d| file_key(loaded, d)).collect(),
        });
        tasks.push(KeyedSnapshot {
            key: name.to_string(),
            ready,
            snapshot: graph.snapshot(key)?,
        });
    }

    let cycle = graph
        .find_cycle()
        .map(|cycle| cycle.into_iter().map(|k| file_key(loaded, k)).collect());

    Ok(InspectOutput {
        name: loaded.file.name.clone(),
        rows,
        tasks,
        cycle,
    })
}

pub fn execute(args: InspectArgs, json_mode: bool) -> Result<()> {
    let loaded = GraphFile::load(&args.graph)?.build()?;
    output(&inspect(&loaded)?, json_mode);
    Ok(())
}
