//! Coverage for the clap surface: flag defaults, conflicts, and
//! subcommand routing, exercised the way an external caller invokes the
//! binary.

use astdb::cli::SnapshotAction;
use astdb::{Cli, Command};
use clap::Parser;

fn parse(args: &[&str]) -> Cli {
    let mut full = vec!["astdb"];
    full.extend_from_slice(args);
    Cli::parse_from(full)
}

#[test]
fn workspace_defaults_to_current_directory() {
    let cli = parse(&["init"]);
    assert_eq!(cli.workspace, std::path::PathBuf::from("."));
    assert!(cli.config.is_none());
}

#[test]
fn parse_changed_and_staged_are_mutually_exclusive() {
    let err = Cli::try_parse_from(["astdb", "parse", "--changed", "--staged"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
}

#[test]
fn parse_defaults_match_the_documented_cli_surface() {
    let cli = parse(&["parse"]);
    let Command::Parse {
        changed,
        staged,
        glob,
        base,
        force,
        batch_size,
        dry_run,
        output_stats,
    } = cli.command
    else {
        panic!("expected Command::Parse");
    };
    assert!(!changed);
    assert!(!staged);
    assert!(glob.is_none());
    assert_eq!(base, "HEAD");
    assert!(!force);
    assert_eq!(batch_size, 50);
    assert!(!dry_run);
    assert!(!output_stats);
}

#[test]
fn query_top_defaults_to_ten() {
    let cli = parse(&["query", "find the parser"]);
    let Command::Query { text, top } = cli.command else {
        panic!("expected Command::Query");
    };
    assert_eq!(text, "find the parser");
    assert_eq!(top, 10);
}

#[test]
fn watch_collects_trailing_globs_as_positional_args() {
    let cli = parse(&["watch", "src/**/*.rs", "tests/**/*.rs"]);
    let Command::Watch { globs } = cli.command else {
        panic!("expected Command::Watch");
    };
    assert_eq!(globs, vec!["src/**/*.rs".to_string(), "tests/**/*.rs".to_string()]);
}

#[test]
fn snapshot_create_requires_an_output_path() {
    let err = Cli::try_parse_from(["astdb", "snapshot", "create"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
}

#[test]
fn snapshot_create_parses_tags_and_compression_level() {
    let cli = parse(&[
        "snapshot",
        "create",
        "--output",
        "snap.tar.gz",
        "--tag",
        "nightly",
        "--tag",
        "v2",
        "--compression-level",
        "9",
    ]);
    let Command::Snapshot { action } = cli.command else {
        panic!("expected Command::Snapshot");
    };
    let SnapshotAction::Create {
        output,
        tag,
        compression_level,
        include_models,
        ..
    } = action
    else {
        panic!("expected SnapshotAction::Create");
    };
    assert_eq!(output, std::path::PathBuf::from("snap.tar.gz"));
    assert_eq!(tag, vec!["nightly".to_string(), "v2".to_string()]);
    assert_eq!(compression_level, 9);
    assert!(!include_models);
}
