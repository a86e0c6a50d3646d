use clap::Parser;
use taskweave::cli::types::{CallArgs, InspectArgs, ToolsArgs};
use taskweave::cli::{Cli, Commands};

#[test]
fn test_parse_inspect() {
    let cli = Cli::try_parse_from(["taskweave", "inspect", "graph.yaml"]).unwrap();

    assert!(!cli.json);
    match cli.command {
        Commands::Inspect(InspectArgs { graph }) => {
            assert_eq!(graph.to_str(), Some("graph.yaml"));
        }
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_parse_tools_with_agent() {
    let cli = Cli::try_parse_from([
        "taskweave",
        "tools",
        "graph.yaml",
        "notes",
        "--agent",
        "writer",
    ])
    .unwrap();

    match cli.command {
        Commands::Tools(ToolsArgs { graph, key, agent }) => {
            assert_eq!(graph.to_str(), Some("graph.yaml"));
            assert_eq!(key, "notes");
            assert_eq!(agent.as_deref(), Some("writer"));
        }
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_parse_call_with_json_flag_after_subcommand() {
    let cli = Cli::try_parse_from([
        "taskweave",
        "call",
        "graph.yaml",
        "mark_task_1a2b3c4d_successful",
        r#"{"result": 3}"#,
        "--write",
        "--json",
    ])
    .unwrap();

    assert!(cli.json);
    match cli.command {
        Commands::Call(CallArgs {
            tool, args, write, ..
        }) => {
            assert_eq!(tool, "mark_task_1a2b3c4d_successful");
            assert_eq!(args, r#"{"result": 3}"#);
            assert!(write);
        }
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_call_requires_arguments() {
    let result = Cli::try_parse_from(["taskweave", "call", "graph.yaml", "mark_task_x_failed"]);
    assert!(result.is_err());
}

#[test]
fn test_unknown_command_fails() {
    assert!(Cli::try_parse_from(["taskweave", "run", "graph.yaml"]).is_err());
}
