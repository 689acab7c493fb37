//! CLI argument parsing tests

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{Cli, Commands};

#[test]
fn test_defaults() {
    let cli = Cli::try_parse_from(["skiff"]).unwrap();
    assert!(cli.command.is_none());
    assert!(!cli.verbose);
    assert_eq!(cli.config, PathBuf::from("/data/options.json"));
}

#[test]
fn test_subcommands_parse() {
    let cli = Cli::try_parse_from(["skiff", "once"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Once)));

    let cli = Cli::try_parse_from(["skiff", "check"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Check)));

    let cli = Cli::try_parse_from(["skiff", "run"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Run)));
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["skiff", "run", "--verbose", "--config", "/tmp/opts.json"])
        .unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.config, PathBuf::from("/tmp/opts.json"));
}

#[test]
fn test_unknown_subcommand_rejected() {
    assert!(Cli::try_parse_from(["skiff", "frobnicate"]).is_err());
}
