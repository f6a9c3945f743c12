// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for CLI parsing and the `hotmod` binary.

use std::fs;
use std::path::Path;
use std::process::{Command as Process, Output};

use clap::Parser;
use hotmod::cli::reload::{LoadArgs, ReloadArgs, ScanArgs};
use hotmod::cli::{Cli, Command};
use hotmod::module::{ModuleKind, render_module_binary};
use tempfile::TempDir;

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn cli_version_command() {
    let cli = Cli::try_parse_from(["hotmod", "version"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Version)));
    assert!(cli.global.inis.is_empty());
}

#[test]
fn cli_scan_verbose() {
    let cli = Cli::try_parse_from(["hotmod", "scan", "-v"]).unwrap();
    let Some(Command::Scan(ScanArgs { verbose })) = cli.command else {
        panic!("expected scan command");
    };
    assert!(verbose);
}

#[test]
fn cli_load_no_progress() {
    let cli = Cli::try_parse_from(["hotmod", "--mods", "mods", "load", "--no-progress"]).unwrap();
    let Some(Command::Load(LoadArgs { no_progress })) = cli.command else {
        panic!("expected load command");
    };
    assert!(no_progress);
    insta::assert_debug_snapshot!(cli.global.to_config_overrides(), @r#"
    [
        "paths.mods=mods",
    ]
    "#);
}

#[test]
fn cli_reload_short_cycles() {
    let cli = Cli::try_parse_from(["hotmod", "reload", "-n", "4"]).unwrap();
    let Some(Command::Reload(ReloadArgs { cycles, no_progress })) = cli.command else {
        panic!("expected reload command");
    };
    assert_eq!(cycles, 4);
    assert!(!no_progress);
}

#[test]
fn cli_repeated_set_options_keep_order() {
    let cli = Cli::try_parse_from([
        "hotmod",
        "-s",
        "pool.disabled=[]",
        "--set",
        "reload.poll_interval_ms=10",
        "options",
    ])
    .unwrap();
    assert_eq!(
        cli.global.options,
        vec!["pool.disabled=[]", "reload.poll_interval_ms=10"]
    );
}

#[test]
fn cli_unknown_command_fails() {
    assert!(Cli::try_parse_from(["hotmod", "deploy"]).is_err());
}

// =============================================================================
// Binary
// =============================================================================

fn write_library(root: &Path, rel: &str, name: &str, version: &str, refs: &[&str]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let body = render_module_binary(
        name,
        version.parse().unwrap(),
        ModuleKind::Library,
        None,
        refs,
    );
    fs::write(path, body).unwrap();
}

fn hotmod(cwd: &Path, args: &[&str]) -> Output {
    Process::new(env!("CARGO_BIN_EXE_hotmod"))
        .current_dir(cwd)
        .args(["--log-level", "0", "--set", "global.log_file="])
        .args(args)
        .env_remove("HOTMOD_PATHS__MODS")
        .output()
        .unwrap()
}

#[test]
fn binary_version() {
    let dir = TempDir::new().unwrap();
    let output = hotmod(dir.path(), &["version"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        env!("CARGO_PKG_VERSION")
    );
}

#[test]
fn binary_scan_lists_modules() {
    let dir = TempDir::new().unwrap();
    let mods = dir.path().join("mods");
    write_library(&mods, "a/Foo.mod", "Foo", "1.2.0", &["Bar"]);
    write_library(&mods, "b/Bar.mod", "Bar", "1.0.0", &[]);

    let output = hotmod(dir.path(), &["--mods", "mods", "scan"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let names: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(names, vec!["Bar", "Foo"]);
}

#[test]
fn binary_scan_fails_on_conflict() {
    let dir = TempDir::new().unwrap();
    let mods = dir.path().join("mods");
    write_library(&mods, "a/Foo.mod", "Foo", "2.0.0", &[]);
    write_library(&mods, "b/Foo.mod", "Foo", "1.5.0", &[]);

    let output = hotmod(dir.path(), &["--mods", "mods", "scan"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("[fatal] version conflict"));
}

#[test]
fn binary_reload_without_mods_root_fails() {
    let dir = TempDir::new().unwrap();
    let output = hotmod(dir.path(), &["reload", "--no-progress"]);
    assert!(!output.status.success());
}

#[test]
fn binary_reload_cycles() {
    let dir = TempDir::new().unwrap();
    let mods = dir.path().join("mods");
    write_library(&mods, "a/Foo.mod", "Foo", "1.2.0", &["Bar"]);
    write_library(&mods, "b/Bar.mod", "Bar", "1.0.0", &[]);

    let output = hotmod(
        dir.path(),
        &["--mods", "mods", "reload", "--cycles", "2", "--no-progress"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("generation 3: completed"));
    assert!(stdout.contains("  load order: Bar, Foo"));
    assert!(stdout.contains("unloaded all modules"));
}
