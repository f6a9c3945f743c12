// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::cli::{Cli, Command};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn test_parse_version() {
    let cli = Cli::try_parse_from(["hotmod", "version"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Version)));
}

#[test]
fn test_parse_global_options() {
    let cli = Cli::try_parse_from([
        "hotmod",
        "-l",
        "5",
        "-m",
        "/srv/mods",
        "--ini",
        "a.toml",
        "--ini",
        "b.toml",
        "-s",
        "pool.pattern=**/*.bin",
        "scan",
    ])
    .unwrap();

    assert_eq!(cli.global.log_level, Some(5));
    assert_eq!(cli.global.mods, Some(PathBuf::from("/srv/mods")));
    assert_eq!(
        cli.global.inis,
        vec![PathBuf::from("a.toml"), PathBuf::from("b.toml")]
    );
    assert!(matches!(cli.command, Some(Command::Scan(_))));
}

#[test]
fn test_config_overrides() {
    let cli = Cli::try_parse_from([
        "hotmod",
        "-l",
        "4",
        "--log-file",
        "run.log",
        "-m",
        "/srv/mods",
        "-s",
        "reload.leak_check=false",
        "options",
    ])
    .unwrap();

    insta::assert_debug_snapshot!(cli.global.to_config_overrides(), @r#"
    [
        "reload.leak_check=false",
        "global.output_log_level=4",
        "global.file_log_level=4",
        "global.log_file=run.log",
        "paths.mods=/srv/mods",
    ]
    "#);
}

#[test]
fn test_file_log_level_overrides_log_level() {
    let cli =
        Cli::try_parse_from(["hotmod", "-l", "2", "--file-log-level", "6", "options"]).unwrap();
    let overrides = cli.global.to_config_overrides();
    assert!(overrides.contains(&"global.output_log_level=2".to_string()));
    assert!(overrides.contains(&"global.file_log_level=6".to_string()));
}

#[test]
fn test_log_level_out_of_range() {
    assert!(Cli::try_parse_from(["hotmod", "-l", "7", "version"]).is_err());
}

#[test]
fn test_parse_reload_cycles() {
    let cli = Cli::try_parse_from(["hotmod", "reload", "--cycles", "3", "--no-progress"]).unwrap();
    let Some(Command::Reload(args)) = cli.command else {
        panic!("expected reload command");
    };
    assert_eq!(args.cycles, 3);
    assert!(args.no_progress);

    let cli = Cli::try_parse_from(["hotmod", "reload"]).unwrap();
    let Some(Command::Reload(args)) = cli.command else {
        panic!("expected reload command");
    };
    assert_eq!(args.cycles, 1);
}

#[test]
fn test_no_command() {
    let cli = Cli::try_parse_from(["hotmod"]).unwrap();
    assert!(cli.command.is_none());
}
