// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{CommandPatcher, PatchOutcome, PatchTarget, Patcher, sanitize};

fn targets() -> Vec<PatchTarget> {
    vec![
        PatchTarget::new("Foo", "a/Foo.mod", b"foo".to_vec()),
        PatchTarget::new("Bar", "b/Bar.mod", b"bar".to_vec()),
    ]
}

#[test]
fn test_outcome_accessors() {
    let ok = PatchOutcome::ok("Foo");
    assert!(ok.is_ok());
    assert_eq!(ok.error(), None);

    let failed = PatchOutcome::failed("Bar", "boom");
    assert!(!failed.is_ok());
    assert_eq!(failed.module(), "Bar");
    assert_eq!(failed.error(), Some("boom"));
}

#[test]
fn test_sanitize() {
    assert_eq!(sanitize("My Mod/../x"), "My_Mod_.._x");
    assert_eq!(sanitize("core-lib_2.0"), "core-lib_2.0");
}

#[test]
fn test_command_appends_file_without_placeholder() {
    let patcher = CommandPatcher::new("echo", "echo", vec!["-n".to_string()]);
    let command = patcher.command_for(std::path::Path::new("/tmp/x.bin"));
    let args: Vec<_> = command.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
    assert_eq!(args, vec!["-n", "/tmp/x.bin"]);
}

#[test]
fn test_command_substitutes_placeholder() {
    let patcher = CommandPatcher::new(
        "tool",
        "tool",
        vec!["--in={file}".to_string(), "--fast".to_string()],
    );
    let command = patcher.command_for(std::path::Path::new("/tmp/x.bin"));
    let args: Vec<_> = command.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
    assert_eq!(args, vec!["--in=/tmp/x.bin", "--fast"]);
}

#[cfg(unix)]
#[test]
fn test_command_rewrites_bytes() {
    let patcher = CommandPatcher::new(
        "upper",
        "sh",
        vec![
            "-c".to_string(),
            "tr a-z A-Z < \"$0\" > \"$0.tmp\" && mv \"$0.tmp\" \"$0\"".to_string(),
            "{file}".to_string(),
        ],
    );
    let mut targets = targets();
    let outcomes = patcher.patch(&mut targets).unwrap();

    assert!(outcomes.iter().all(PatchOutcome::is_ok));
    assert_eq!(targets[0].bytes(), b"FOO");
    assert_eq!(targets[1].bytes(), b"BAR");
}

#[cfg(unix)]
#[test]
fn test_colliding_names_get_separate_staging_files() {
    let patcher = CommandPatcher::new(
        "stamp",
        "sh",
        vec![
            "-c".to_string(),
            "echo noise; basename \"$0\" > \"$0\"".to_string(),
            "{file}".to_string(),
        ],
    );
    let mut targets = vec![
        PatchTarget::new("a b", "a/a b.mod", b"first".to_vec()),
        PatchTarget::new("a_b", "b/a_b.mod", b"second".to_vec()),
    ];
    let outcomes = patcher.patch(&mut targets).unwrap();

    assert!(outcomes.iter().all(PatchOutcome::is_ok));
    assert_eq!(targets[0].bytes(), b"0-a_b.bin\n");
    assert_eq!(targets[1].bytes(), b"1-a_b.bin\n");
}

#[cfg(unix)]
#[test]
fn test_command_failure_is_per_target() {
    let patcher = CommandPatcher::new(
        "picky",
        "sh",
        vec![
            "-c".to_string(),
            "grep -q foo \"$0\" || exit 3".to_string(),
            "{file}".to_string(),
        ],
    );
    let mut targets = targets();
    let outcomes = patcher.patch(&mut targets).unwrap();

    assert!(outcomes[0].is_ok());
    assert!(!outcomes[1].is_ok());
    assert!(outcomes[1].error().unwrap().contains("code 3"));
    assert_eq!(targets[1].bytes(), b"bar");
}

#[test]
fn test_missing_program_fails_every_target() {
    let patcher = CommandPatcher::new("ghost", "hotmod-no-such-program-for-tests", Vec::new());
    let mut targets = targets();
    let outcomes = patcher.patch(&mut targets).unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| !o.is_ok()));
    assert!(outcomes[0].error().unwrap().contains("failed to spawn"));
    assert_eq!(targets[0].bytes(), b"foo");
}
