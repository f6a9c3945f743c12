// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! End-to-end reload scenarios over a mods directory on disk.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use hotmod::cmd::display::JobDisplay;
use hotmod::cmd::reload::ReloadSession;
use hotmod::config::{Config, ConfigLoader};
use hotmod::core::progress::ProgressTracker;
use hotmod::error::Result;
use hotmod::host::{CatalogHost, CodeUnit, HostRuntime, ModObject, ReloadAware, StatePayload};
use hotmod::lifecycle::{HostContext, LifecycleOrchestrator, ReloadOutcome};
use hotmod::module::{ModuleKind, render_module_binary};
use hotmod::storage::{DEFAULT_PATTERN, DirectoryStorage};
use serde_json::{Value, json};
use tempfile::TempDir;

// =============================================================================
// Fixtures
// =============================================================================

type Applied = Arc<Mutex<Vec<(String, Value)>>>;

struct Keeper {
    module: String,
    applied: Applied,
}

impl ModObject for Keeper {
    fn reload_aware(self: Arc<Self>) -> Option<Arc<dyn ReloadAware>> {
        Some(self)
    }
}

impl ReloadAware for Keeper {
    fn capture_state(&self) -> Result<Option<StatePayload>> {
        Ok(Some(json!({ "owner": self.module, "items": [1, 2, 3] })))
    }

    fn apply_state(&self, payload: StatePayload) -> Result<()> {
        self.applied
            .lock()
            .unwrap()
            .push((self.module.clone(), payload));
        Ok(())
    }
}

struct Broken;

impl ModObject for Broken {
    fn reload_aware(self: Arc<Self>) -> Option<Arc<dyn ReloadAware>> {
        Some(self)
    }
}

impl ReloadAware for Broken {
    fn capture_state(&self) -> Result<Option<StatePayload>> {
        anyhow::bail!("save slot locked")
    }

    fn apply_state(&self, _payload: StatePayload) -> Result<()> {
        Ok(())
    }
}

fn scenario_host(applied: &Applied) -> CatalogHost {
    let applied = Arc::clone(applied);
    CatalogHost::new()
        .with_entry("keeper", move |unit: &CodeUnit| {
            Ok(Arc::new(Keeper {
                module: unit.module().to_string(),
                applied: Arc::clone(&applied),
            }) as Arc<dyn ModObject>)
        })
        .with_entry("broken", |_: &CodeUnit| {
            Ok(Arc::new(Broken) as Arc<dyn ModObject>)
        })
}

fn write_module(
    root: &Path,
    rel: &str,
    name: &str,
    version: &str,
    entry: Option<&str>,
    refs: &[&str],
) {
    let kind = if entry.is_some() {
        ModuleKind::Plugin
    } else {
        ModuleKind::Library
    };
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let body = render_module_binary(name, version.parse().unwrap(), kind, entry, refs);
    fs::write(path, body).unwrap();
}

fn orchestrator(root: &Path, applied: &Applied) -> LifecycleOrchestrator {
    let host = Arc::new(scenario_host(applied)) as Arc<dyn HostRuntime>;
    let storage = Arc::new(DirectoryStorage::new(root, DEFAULT_PATTERN).unwrap());
    LifecycleOrchestrator::new(Arc::new(HostContext::new(host, storage)))
}

fn fatal_texts(tracker: &ProgressTracker) -> Vec<String> {
    tracker
        .messages()
        .iter()
        .filter(|m| m.is_fatal())
        .map(|m| m.text().to_string())
        .collect()
}

fn config_for(root: &Path) -> Config {
    let toml = format!("[paths]\nmods = '{}'\n", root.display());
    ConfigLoader::new().add_toml_str(&toml).build().unwrap()
}

// =============================================================================
// Load Order
// =============================================================================

#[test]
fn reload_dependencies_load_first() {
    let root = TempDir::new().unwrap();
    write_module(root.path(), "a/Foo.mod", "Foo", "1.2.0", None, &["Bar"]);
    write_module(root.path(), "b/Bar.mod", "Bar", "1.0.0", None, &[]);

    let applied = Applied::default();
    let mut orchestrator = orchestrator(root.path(), &applied);
    let tracker = ProgressTracker::new();
    let report = orchestrator.load_initial(&tracker);

    assert_eq!(report.outcome, ReloadOutcome::Completed);
    assert_eq!(report.load_order, vec!["Bar", "Foo"]);
    assert!(orchestrator.loaded().contains("Foo"));
    assert!(orchestrator.loaded().contains("Bar"));
    assert!(fatal_texts(&tracker).is_empty());
}

#[test]
fn reload_two_node_cycle_aborts_with_nothing_loaded() {
    let root = TempDir::new().unwrap();
    write_module(root.path(), "a/Ping.mod", "Ping", "1.0.0", None, &["Pong"]);
    write_module(root.path(), "a/Pong.mod", "Pong", "1.0.0", None, &["Ping"]);

    let applied = Applied::default();
    let mut orchestrator = orchestrator(root.path(), &applied);
    let tracker = ProgressTracker::new();
    let report = orchestrator.load_initial(&tracker);

    assert_eq!(report.outcome, ReloadOutcome::Aborted);
    assert!(orchestrator.loaded().is_empty());
    insta::assert_debug_snapshot!(fatal_texts(&tracker), @r#"
    [
        "dependency cycle between modules: Ping, Pong",
        "reload of generation 1 abandoned after 1 fatal error(s)",
    ]
    "#);
}

#[test]
fn reload_three_node_cycle_aborts_with_nothing_loaded() {
    let root = TempDir::new().unwrap();
    write_module(root.path(), "a/A.mod", "A", "1.0.0", None, &["B"]);
    write_module(root.path(), "b/B.mod", "B", "1.0.0", None, &["C"]);
    write_module(root.path(), "c/C.mod", "C", "1.0.0", None, &["A"]);
    write_module(root.path(), "c/Free.mod", "Free", "1.0.0", None, &[]);

    let applied = Applied::default();
    let mut orchestrator = orchestrator(root.path(), &applied);
    let tracker = ProgressTracker::new();
    let report = orchestrator.load_initial(&tracker);

    assert_eq!(report.outcome, ReloadOutcome::Aborted);
    assert!(orchestrator.loaded().is_empty());
    assert!(
        fatal_texts(&tracker)
            .iter()
            .any(|text| text.starts_with("dependency cycle between modules: A, B, C"))
    );
}

// =============================================================================
// State Hand-off
// =============================================================================

#[test]
fn reload_replays_the_captured_payload() {
    let root = TempDir::new().unwrap();
    write_module(root.path(), "a/Inv.mod", "Inv", "1.0.0", Some("keeper"), &[]);

    let applied = Applied::default();
    let mut orchestrator = orchestrator(root.path(), &applied);
    orchestrator.load_initial(&ProgressTracker::new());

    // A newer build of the same module lands between generations.
    write_module(root.path(), "a/Inv.mod", "Inv", "1.1.0", Some("keeper"), &[]);
    let report = orchestrator.reload(&ProgressTracker::new());

    assert_eq!(report.outcome, ReloadOutcome::Completed);
    assert_eq!(report.replayed, vec!["Inv"]);
    assert_eq!(
        *applied.lock().unwrap(),
        vec![(
            "Inv".to_string(),
            json!({ "owner": "Inv", "items": [1, 2, 3] })
        )]
    );
}

#[test]
fn reload_capture_failure_only_affects_that_module() {
    let root = TempDir::new().unwrap();
    write_module(root.path(), "a/X.mod", "X", "1.0.0", Some("broken"), &[]);
    write_module(root.path(), "a/Y.mod", "Y", "1.0.0", Some("keeper"), &[]);
    write_module(root.path(), "b/Z.mod", "Z", "1.0.0", None, &[]);

    let applied = Applied::default();
    let mut orchestrator = orchestrator(root.path(), &applied);
    orchestrator.load_initial(&ProgressTracker::new());

    let tracker = ProgressTracker::new();
    let report = orchestrator.reload(&tracker);

    assert_eq!(report.outcome, ReloadOutcome::Completed);
    assert_eq!(report.generation, 2);
    assert_eq!(orchestrator.loaded().names(), vec!["X", "Y", "Z"]);
    assert_eq!(report.replayed, vec!["Y"]);
    assert!(!report.captured.contains(&"X".to_string()));
    assert_eq!(
        applied
            .lock()
            .unwrap()
            .iter()
            .map(|(module, _)| module.as_str())
            .collect::<Vec<_>>(),
        vec!["Y"]
    );
    insta::assert_debug_snapshot!(fatal_texts(&tracker), @r#"
    [
        "reload state of module 'X' failed: save slot locked",
    ]
    "#);
}

// =============================================================================
// Session
// =============================================================================

#[tokio::test]
async fn session_reload_cycles_over_the_demo_host() {
    let root = TempDir::new().unwrap();
    write_module(root.path(), "core/Core.mod", "Core", "1.0.0", None, &[]);
    write_module(
        root.path(),
        "tally/Tally.mod",
        "Tally",
        "1.0.0",
        Some("counter"),
        &["Core"],
    );

    let session = ReloadSession::from_config(&config_for(root.path())).unwrap();
    let display = JobDisplay::new(false, std::time::Duration::from_millis(5));

    let first = session.cycle(&display).await.unwrap();
    assert_eq!(first.generation, 1);
    assert_eq!(first.load_order, vec!["Core", "Tally"]);

    let second = session.cycle(&display).await.unwrap();
    assert_eq!(second.generation, 2);
    assert_eq!(second.outcome, ReloadOutcome::Completed);
    assert_eq!(second.replayed, vec!["Tally"]);
    assert_eq!(session.loaded(), vec!["Core", "Tally"]);

    assert!(session.shutdown().is_empty());
    assert!(session.loaded().is_empty());
}

#[tokio::test]
async fn session_surfaces_aborted_generation() {
    let root = TempDir::new().unwrap();
    write_module(root.path(), "a/Ping.mod", "Ping", "1.0.0", None, &["Pong"]);
    write_module(root.path(), "a/Pong.mod", "Pong", "1.0.0", None, &["Ping"]);

    let session = ReloadSession::from_config(&config_for(root.path())).unwrap();
    let display = JobDisplay::new(false, std::time::Duration::from_millis(5));
    let report = session.cycle(&display).await.unwrap();

    assert!(report.is_aborted());
    assert!(session.loaded().is_empty());
    let last = session.progress().last_fatal().unwrap();
    assert_eq!(
        last.text(),
        "reload of generation 1 abandoned after 1 fatal error(s)"
    );
}

#[test]
fn test_display_prints_each_warning_once() {
    let tracker = ProgressTracker::new();
    let display = JobDisplay::new(false, std::time::Duration::from_millis(1));

    tracker.info("scanning");
    tracker.warning("Foo: disabled");
    tracker.fatal("Bar: missing dependency");
    assert_eq!(display.print_new_messages(&tracker), 2);
    assert_eq!(display.print_new_messages(&tracker), 0);

    tracker.debug("noise");
    tracker.warning("Baz: leaked");
    display.tick(&tracker);
    assert_eq!(display.print_new_messages(&tracker), 0);
}
