//! End-to-end scenarios for the task graph: structure, readiness, the
//! completion protocol and the execution entry points.

mod common;

use std::sync::Arc;

use common::ScriptedOrchestrator;
use serde_json::json;
use taskweave::domain::models::{Agent, Flow, ResultType, ResultValidator, Shape, TaskDefinition};
use taskweave::domain::ports::RunOptions;
use taskweave::services::{ExecutionContext, TaskGraph, TaskRunner, MAX_LLM_CALLS_REASON};
use taskweave::{CompletionTool, TaskError, TaskKey, TaskStatus};

fn success_and_failure(graph: &TaskGraph, key: TaskKey) -> (CompletionTool, CompletionTool) {
    let mut tools = graph.completion_tools(key, None).unwrap().into_iter();
    (tools.next().unwrap(), tools.next().unwrap())
}

#[test]
fn identical_definitions_get_identical_ids() {
    let mut graph = TaskGraph::new();
    let definition = || {
        TaskDefinition::new("Summarize")
            .with_instructions("Two sentences")
            .with_result_type(Shape::list(Shape::String))
            .with_context("doc", "README.md")
    };
    let a = graph.insert(definition()).unwrap();
    let b = graph.insert(definition()).unwrap();

    assert_ne!(a, b);
    assert_eq!(graph.task(a).unwrap().id(), graph.task(b).unwrap().id());

    let c = graph
        .insert(definition().with_context("extra", true))
        .unwrap();
    assert_ne!(graph.task(a).unwrap().id(), graph.task(c).unwrap().id());
}

#[test]
fn subtask_is_owned_and_cannot_be_reparented() {
    let mut graph = TaskGraph::new();
    let parent = graph.insert(TaskDefinition::new("Ship v2")).unwrap();
    let other = graph.insert(TaskDefinition::new("Ship v3")).unwrap();
    let sub = graph.insert(TaskDefinition::new("Write docs")).unwrap();

    graph.add_subtask(parent, sub).unwrap();

    let p = graph.task(parent).unwrap();
    assert_eq!(graph.task(sub).unwrap().parent(), Some(parent));
    assert!(p.subtask_keys().contains(&sub));
    assert!(p.depends_on().contains(&sub));
    assert!(graph.task(sub).unwrap().downstream().contains(&parent));

    assert!(matches!(
        graph.add_subtask(other, sub),
        Err(TaskError::AlreadyHasParent { .. })
    ));
}

#[test]
fn readiness_flips_when_dependency_completes() {
    for finish in [TaskStatus::Successful, TaskStatus::Failed, TaskStatus::Skipped] {
        let mut graph = TaskGraph::new();
        let b = graph.insert(TaskDefinition::new("B")).unwrap();
        let a = graph.insert(TaskDefinition::new("A").with_dependency(b)).unwrap();

        assert!(!graph.is_ready(a).unwrap());
        graph.mark_running(b).unwrap();
        assert!(!graph.is_ready(a).unwrap());

        match finish {
            TaskStatus::Successful => graph.mark_successful(b, json!("done")).unwrap(),
            TaskStatus::Failed => graph.mark_failed(b, "boom").unwrap(),
            _ => graph.mark_skipped(b).unwrap(),
        }
        assert!(graph.is_ready(a).unwrap(), "not ready after {finish}");
    }
}

#[test]
fn labels_are_chosen_by_index() {
    let mut graph = TaskGraph::new();
    let key = graph
        .insert(
            TaskDefinition::new("Pick a color")
                .with_result_type(ResultType::labels(["red", "green", "blue"]).unwrap()),
        )
        .unwrap();
    let (success, _) = success_and_failure(&graph, key);

    let description = success.definition().description;
    for (i, color) in ["red", "green", "blue"].iter().enumerate() {
        assert!(description.contains(&format!("Option {i}: {color}")));
    }

    let err = success.invoke(&mut graph, json!({ "result": 5 })).unwrap_err();
    assert!(err.agent_message().starts_with("Error: "));
    assert_eq!(graph.task(key).unwrap().status(), TaskStatus::Pending);

    let message = success.invoke(&mut graph, json!({ "result": 1 })).unwrap();
    assert!(message.ends_with("marked successful."));
    let task = graph.task(key).unwrap();
    assert_eq!(task.status(), TaskStatus::Successful);
    assert_eq!(task.result(), Some(&json!("green")));
}

#[test]
fn no_result_task_rejects_a_value() {
    let mut graph = TaskGraph::new();
    let key = graph
        .insert(TaskDefinition::new("Send the email").without_result())
        .unwrap();
    let (success, _) = success_and_failure(&graph, key);

    assert!(success.invoke(&mut graph, json!({ "result": "sent" })).is_err());
    assert_eq!(graph.task(key).unwrap().status(), TaskStatus::Pending);

    success.invoke(&mut graph, json!({})).unwrap();
    assert!(graph.task(key).unwrap().is_successful());
}

#[test]
fn success_is_guarded_but_failure_overwrites() {
    let mut graph = TaskGraph::new();
    let key = graph.insert(TaskDefinition::new("Name the project")).unwrap();
    let (success, failure) = success_and_failure(&graph, key);

    success.invoke(&mut graph, json!({ "result": "taskweave" })).unwrap();
    let err = success
        .invoke(&mut graph, json!({ "result": "other" }))
        .unwrap_err();
    assert!(err.to_string().contains("already marked successful"));
    assert_eq!(graph.task(key).unwrap().result(), Some(&json!("taskweave")));

    // the failure tool has no such guard and replaces the result
    failure
        .invoke(&mut graph, json!({ "reason": "changed my mind" }))
        .unwrap();
    let task = graph.task(key).unwrap();
    assert_eq!(task.status(), TaskStatus::Failed);
    assert_eq!(task.result(), Some(&json!("changed my mind")));
}

#[test]
fn integer_result_is_coerced_from_text() {
    let mut graph = TaskGraph::new();
    let key = graph
        .insert(TaskDefinition::new("classify").with_result_type(Shape::Integer))
        .unwrap();
    let (success, _) = success_and_failure(&graph, key);

    success.invoke(&mut graph, json!({ "result": "3" })).unwrap();
    let task = graph.task(key).unwrap();
    assert_eq!(task.status(), TaskStatus::Successful);
    assert_eq!(task.result(), Some(&json!(3)));
    assert_eq!(task.result_as::<i64>().unwrap().unwrap(), 3);
}

#[test]
fn custom_validator_message_reaches_the_agent() {
    let mut graph = TaskGraph::new();
    let key = graph
        .insert(
            TaskDefinition::new("Count the apples")
                .with_result_type(Shape::Integer)
                .with_result_validator(ResultValidator::new(|value| {
                    match value.as_i64() {
                        Some(n) if n < 0 => Err("The count cannot be negative".to_string()),
                        _ => Ok(value),
                    }
                })),
        )
        .unwrap();
    graph.mark_running(key).unwrap();
    let (success, _) = success_and_failure(&graph, key);

    let err = success.invoke(&mut graph, json!({ "result": -1 })).unwrap_err();
    assert!(err.agent_message().contains("The count cannot be negative"));
    assert_eq!(graph.task(key).unwrap().status(), TaskStatus::Running);
    assert!(graph.task(key).unwrap().result().is_none());
}

#[test]
fn agents_resolve_through_parent_then_flow() {
    let mut graph = TaskGraph::new();
    let lead = Agent::new("lead");
    let root = graph
        .insert(TaskDefinition::new("root").with_agents(vec![lead.clone()]))
        .unwrap();
    let mut ctx = ExecutionContext::new()
        .with_flow(Flow::new("docs").with_default_agent(Agent::new("scribe")));

    let child = ctx.with_task(root, |ctx| {
        graph.insert_in(ctx, TaskDefinition::new("child")).unwrap()
    });
    let loose = graph.insert_in(&ctx, TaskDefinition::new("loose")).unwrap();

    assert_eq!(graph.get_agents(child, &ctx).unwrap(), vec![lead]);
    assert_eq!(graph.get_agents(loose, &ctx).unwrap()[0].name, "scribe");
}

#[tokio::test]
async fn run_async_returns_the_validated_result() {
    let mut graph = TaskGraph::new();
    let key = graph
        .insert(TaskDefinition::new("classify").with_result_type(Shape::Integer))
        .unwrap();
    let orchestrator = Arc::new(ScriptedOrchestrator::new(vec![
        ("successful", json!({ "result": "three" })),
        ("successful", json!({ "result": "3" })),
    ]));
    let runner = TaskRunner::new(orchestrator.clone());

    let result = runner.run_async(&mut graph, key).await.unwrap();
    assert_eq!(result, Some(json!(3)));

    let transcript = orchestrator.transcript();
    assert_eq!(transcript.len(), 2);
    assert!(transcript[0].starts_with("Error: "));
    assert_eq!(graph.task(key).unwrap().llm_calls(), 2);
}

#[test]
fn run_raises_the_failure_reason() {
    let mut graph = TaskGraph::new();
    let key = graph.insert(TaskDefinition::new("Fetch the data")).unwrap();
    let orchestrator = Arc::new(ScriptedOrchestrator::new(vec![(
        "failed",
        json!({ "reason": "API returned 503" }),
    )]));

    let err = TaskRunner::new(orchestrator)
        .run(&mut graph, key)
        .unwrap_err();
    match err {
        TaskError::TaskFailed { reason, .. } => assert_eq!(reason, "API returned 503"),
        other => panic!("expected TaskFailed, got {other:?}"),
    }
}

#[test]
fn run_returns_none_when_budget_runs_out() {
    let mut graph = TaskGraph::new();
    let key = graph.insert(TaskDefinition::new("Think hard")).unwrap();
    let orchestrator = Arc::new(ScriptedOrchestrator::new(vec![
        ("successful", json!({ "result": 1 })),
        ("successful", json!({ "result": 2 })),
        ("successful", json!({ "result": "finally" })),
    ]));
    let runner =
        TaskRunner::new(orchestrator).with_options(RunOptions::default().with_max_llm_calls(2));

    assert_eq!(runner.run(&mut graph, key).unwrap(), None);
    assert_eq!(graph.task(key).unwrap().status(), TaskStatus::Running);
}

#[test]
fn task_budget_fails_the_task() {
    let mut graph = TaskGraph::new();
    let key = graph
        .insert(TaskDefinition::new("Guess").with_max_llm_calls(1))
        .unwrap();
    let orchestrator = Arc::new(ScriptedOrchestrator::new(vec![
        ("successful", json!({ "result": 7 })),
        ("successful", json!({ "result": "seven" })),
    ]));

    let err = tokio_test::block_on(TaskRunner::new(orchestrator).run_async(&mut graph, key))
        .unwrap_err();
    assert!(matches!(err, TaskError::TaskFailed { ref reason, .. } if reason == MAX_LLM_CALLS_REASON));
}

#[test]
fn completion_agents_restrict_the_tools() {
    let reviewer = Agent::new("reviewer");
    let mut graph = TaskGraph::new();
    let key = graph
        .insert(
            TaskDefinition::new("Approve the release")
                .with_completion_agents(vec![reviewer.clone()]),
        )
        .unwrap();

    let orchestrator = Arc::new(ScriptedOrchestrator::new(vec![(
        "successful",
        json!({ "result": "approved" }),
    )]));
    let outsider = TaskRunner::new(orchestrator)
        .with_options(RunOptions::default().with_agent(Agent::new("intern")));
    assert!(matches!(
        outsider.run(&mut graph, key),
        Err(TaskError::Orchestration(_))
    ));

    let orchestrator = Arc::new(ScriptedOrchestrator::new(vec![(
        "successful",
        json!({ "result": "approved" }),
    )]));
    let runner =
        TaskRunner::new(orchestrator).with_options(RunOptions::default().with_agent(reviewer));
    assert_eq!(runner.run(&mut graph, key).unwrap(), Some(json!("approved")));
}
