// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{Config, ConfigLoader, PatchHookConfig};
use crate::logging::LogLevel;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.global.output_log_level, LogLevel::INFO);
    assert_eq!(config.global.file_log_level, LogLevel::TRACE);
    assert_eq!(config.pool.pattern, "**/*.mod");
    assert!(config.pool.blacklist.is_empty());
    assert!(config.loader.patch_hooks.is_empty());
    assert!(config.reload.leak_check);
    assert_eq!(config.reload.poll_interval_ms, 50);
    assert!(config.paths.mods.is_none());
}

#[test]
fn test_config_parse() {
    let config = Config::parse(
        r#"
[paths]
mods = "/srv/mods"

[pool]
blacklist = ["Cheat*"]
disabled = ["Noisy"]

[[loader.patch_hooks]]
name = "strip"
command = "strip-debug"
args = ["--in-place", "{file}"]

[reload]
leak_check = false
"#,
    )
    .unwrap();

    assert_eq!(config.paths.mods, Some(PathBuf::from("/srv/mods")));
    assert_eq!(config.pool.blacklist, vec!["Cheat*"]);
    assert_eq!(config.pool.disabled, vec!["Noisy"]);
    assert_eq!(
        config.loader.patch_hooks,
        vec![PatchHookConfig {
            name: "strip".to_string(),
            command: PathBuf::from("strip-debug"),
            args: vec!["--in-place".to_string(), "{file}".to_string()],
        }]
    );
    assert!(!config.reload.leak_check);
}

#[test]
fn test_relative_mods_root_is_resolved() {
    let config = Config::parse("[paths]\nmods = \"mods\"").unwrap();
    let mods = config.paths.mods.unwrap();
    assert!(mods.is_absolute());
    assert!(mods.ends_with("mods"));
}

#[test]
fn test_missing_mods_root() {
    let config = Config::default();
    let err = config.paths.mods_root().unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"missing required config key 'mods' in section '[paths]'");
}

#[test]
fn test_deny_unknown_fields() {
    assert!(Config::parse("[pool]\nblacklisted = []").is_err());
    assert!(Config::parse("[tasks]\nx = 1").is_err());
}

#[test]
fn test_invalid_globs_are_rejected() {
    assert!(Config::parse("[pool]\nblacklist = [\"{a\"]").is_err());
    assert!(Config::parse("[pool]\npattern = \"**/{a\"").is_err());
}

#[test]
fn test_format_options() {
    let config = Config::parse(
        r#"
[paths]
mods = "/srv/mods"

[pool]
blacklist = ["A*", "B"]
disabled = ["Off"]

[[loader.patch_hooks]]
name = "strip"
command = "strip-debug"
args = ["{file}"]
"#,
    )
    .unwrap();

    insta::assert_snapshot!(config.format_options().join("\n"), @r"
    global.file_log_level   = 5
    global.log_file         = hotmod.log
    global.output_log_level = 3
    loader.patch_hooks.0    = strip: strip-debug {file}
    paths.mods              = /srv/mods
    pool.blacklist          = A*, B
    pool.disabled           = Off
    pool.pattern            = **/*.mod
    reload.leak_check       = true
    reload.poll_interval_ms = 50
    ");
}

#[test]
fn test_config_loader_tracks_files() {
    let loader = ConfigLoader::new()
        .add_toml_str("[reload]\nleak_check = false")
        .add_toml_file_optional("/nonexistent/hotmod.toml");

    assert_eq!(
        loader.format_loaded_files(),
        vec!["1. [string] <string>".to_string()]
    );
}

#[test]
fn test_config_loader_add_toml_file_not_found() {
    let loader = ConfigLoader::new().add_toml_file("/nonexistent/path/to/hotmod.toml");
    assert!(loader.build().is_err());
}

#[test]
fn test_config_loader_add_toml_file_invalid_toml() {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    writeln!(file, "this is not valid toml {{{{{{").expect("failed to write");

    assert!(ConfigLoader::new().add_toml_file(file.path()).build().is_err());
}

#[test]
fn test_config_loader_with_env_prefix() {
    // SAFETY: the variable name is unique to this test.
    unsafe {
        std::env::set_var("HOTMODTEST_RELOAD__POLL_INTERVAL_MS", "250");
    }

    let config = ConfigLoader::new()
        .add_toml_str("[reload]\npoll_interval_ms = 10")
        .with_env_prefix("HOTMODTEST")
        .build()
        .expect("build should succeed");

    // SAFETY: same as above.
    unsafe {
        std::env::remove_var("HOTMODTEST_RELOAD__POLL_INTERVAL_MS");
    }

    assert_eq!(config.reload.poll_interval_ms, 250);
}

#[test]
fn test_config_loader_set_override() {
    let config = ConfigLoader::new()
        .add_toml_str("[reload]\nleak_check = true")
        .set_override("reload.leak_check=false")
        .expect("override should be accepted")
        .build()
        .expect("build should succeed");

    assert!(!config.reload.leak_check);
}

#[test]
fn test_config_loader_set_override_needs_assignment() {
    let err = ConfigLoader::new()
        .set_override("reload.leak_check")
        .err()
        .unwrap();
    assert!(err.to_string().contains("expected KEY=VALUE"));
}

#[test]
fn test_config_loader_layered_sources() {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    writeln!(
        file,
        r#"
[pool]
disabled = ["FromFile"]

[reload]
poll_interval_ms = 5
"#
    )
    .expect("failed to write");

    let config = ConfigLoader::new()
        .add_toml_file(file.path())
        .add_toml_str("[reload]\npoll_interval_ms = 7")
        .build()
        .expect("build should succeed");

    assert_eq!(config.pool.disabled, vec!["FromFile"]);
    assert_eq!(config.reload.poll_interval_ms, 7);
}

#[test]
fn test_config_loader_build_deserialization_error() {
    let result = ConfigLoader::new()
        .add_toml_str("[reload]\nleak_check = \"sometimes\"")
        .build();
    assert!(result.is_err());
}
