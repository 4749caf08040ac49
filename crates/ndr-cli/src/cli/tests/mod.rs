//! CLI parse tests.

use super::{Cli, CliCommand, SdkCommand};
use clap::Parser;
use std::path::Path;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn cli_parse_resolve_defaults() {
    let cli = parse(&["ndr", "resolve"]);
    assert!(cli.project.is_none());
    assert!(!cli.yes);
    match cli.command {
        CliCommand::Resolve { force, auto } => {
            assert!(!force);
            assert!(!auto);
        }
        _ => panic!("expected Resolve"),
    }
}

#[test]
fn cli_parse_resolve_flags() {
    let cli = parse(&[
        "ndr",
        "resolve",
        "--force",
        "--auto",
        "--yes",
        "--project",
        "/tmp/game",
    ]);
    assert!(cli.yes);
    assert_eq!(cli.project.as_deref(), Some(Path::new("/tmp/game")));
    match cli.command {
        CliCommand::Resolve { force, auto } => {
            assert!(force);
            assert!(auto);
        }
        _ => panic!("expected Resolve with flags"),
    }
}

#[test]
fn cli_parse_global_flags_before_subcommand() {
    let cli = parse(&["ndr", "-y", "--project", "game", "clean"]);
    assert!(cli.yes);
    assert_eq!(cli.project.as_deref(), Some(Path::new("game")));
    assert!(matches!(cli.command, CliCommand::Clean));
}

#[test]
fn cli_parse_sdk_list() {
    match parse(&["ndr", "sdk", "list"]).command {
        CliCommand::Sdk {
            action: SdkCommand::List,
        } => {}
        _ => panic!("expected Sdk List"),
    }
}

#[test]
fn cli_parse_sdk_install() {
    match parse(&["ndr", "sdk", "install", "extras;google;m2repository", "platform-tools"]).command {
        CliCommand::Sdk {
            action: SdkCommand::Install { names },
        } => assert_eq!(names, vec!["extras;google;m2repository", "platform-tools"]),
        _ => panic!("expected Sdk Install"),
    }
}

#[test]
fn cli_parse_sdk_install_requires_names() {
    assert!(Cli::try_parse_from(["ndr", "sdk", "install"]).is_err());
}

#[test]
fn cli_parse_simple_commands() {
    assert!(matches!(parse(&["ndr", "deps"]).command, CliCommand::Deps));
    assert!(matches!(parse(&["ndr", "conflicts"]).command, CliCommand::Conflicts));
}

#[test]
fn cli_parse_history_limit() {
    match parse(&["ndr", "history"]).command {
        CliCommand::History { limit } => assert_eq!(limit, 20),
        _ => panic!("expected History"),
    }
    match parse(&["ndr", "history", "--limit", "5"]).command {
        CliCommand::History { limit } => assert_eq!(limit, 5),
        _ => panic!("expected History with --limit"),
    }
}

#[test]
fn cli_parse_completions() {
    match parse(&["ndr", "completions", "bash"]).command {
        CliCommand::Completions { shell } => assert_eq!(shell, clap_complete::Shell::Bash),
        _ => panic!("expected Completions"),
    }
    assert!(Cli::try_parse_from(["ndr", "completions", "cmd.exe"]).is_err());
}

#[test]
fn cli_parse_rejects_unknown_command() {
    assert!(Cli::try_parse_from(["ndr", "download"]).is_err());
}
