// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::Arc;

use serde_json::json;

use super::demo::{CounterMod, GreeterMod, HOST_MODULE_NAME, demo_host};
use super::{
    CatalogHost, CodeUnit, HostRuntime, LegacyModList, ModObject, PluginRegistry, PreparedImage,
};

fn image(module: &str, internal: &str, references: &[&str]) -> PreparedImage {
    PreparedImage::new(
        module.to_string(),
        internal.to_string(),
        1,
        references.iter().map(ToString::to_string).collect(),
        Vec::new(),
    )
}

#[test]
fn test_catalog_loads_units_in_order() {
    let host = CatalogHost::new();
    host.load(&image("Bar", "Bar@g1", &[])).unwrap();
    host.load(&image("Foo", "Foo@g1", &["Bar@g1", "System.Core"]))
        .unwrap();

    assert_eq!(host.load_log(), vec!["Bar@g1", "Foo@g1"]);
    assert_eq!(host.loaded_units(), vec!["Bar@g1", "Foo@g1"]);
}

#[test]
fn test_catalog_rejects_unresolved_reference() {
    let host = CatalogHost::new();
    let err = host
        .load(&image("Foo", "Foo@g1", &["Bar@g1"]))
        .unwrap_err();

    assert!(err.to_string().contains("Bar@g1"));
    assert!(host.loaded_units().is_empty());
}

#[test]
fn test_catalog_rejects_duplicate_internal_name() {
    let host = CatalogHost::new();
    host.load(&image("Foo", "Foo@g1", &[])).unwrap();
    assert!(host.load(&image("Foo", "Foo@g1", &[])).is_err());

    // a fresh generation suffix is a different unit
    host.load(&image("Foo", "Foo@g2", &[])).unwrap();
}

#[test]
fn test_catalog_unload_frees_name() {
    let host = CatalogHost::new();
    let unit = host.load(&image("Foo", "Foo@g1", &[])).unwrap();
    host.unload_unit(&unit);

    assert!(host.loaded_units().is_empty());
    host.load(&image("Foo", "Foo@g1", &[])).unwrap();
}

#[test]
fn test_instantiate_unknown_entry_fails() {
    let host = CatalogHost::new();
    let unit = CodeUnit::from_image(&image("Foo", "Foo@g1", &[]));
    let err = host.instantiate(&unit, "missing").err().unwrap();
    assert!(err.to_string().contains("missing"));
}

#[test]
fn test_demo_host_catalog() {
    let host = demo_host();
    assert_eq!(host.entries(), vec!["counter", "greeter"]);
    assert_eq!(host.reserved_names(), vec![HOST_MODULE_NAME]);

    let unit = CodeUnit::from_image(&image("Foo", "Foo@g1", &[]));
    let counter = host.instantiate(&unit, "counter").unwrap();
    assert!(counter.reload_aware().is_some());

    let greeter = host.instantiate(&unit, "greeter").unwrap();
    assert!(greeter.reload_aware().is_none());
}

#[test]
fn test_counter_state_round_trip() {
    let old = Arc::new(CounterMod::new("Foo"));
    let old_state = Arc::clone(&old).reload_aware().unwrap();
    let payload = old_state.capture_state().unwrap().unwrap();
    assert_eq!(payload, json!({ "reloads": 0 }));

    let new = Arc::new(CounterMod::new("Foo"));
    let new_state = Arc::clone(&new).reload_aware().unwrap();
    new_state.apply_state(payload).unwrap();
    assert_eq!(new.reloads(), 1);

    assert!(new_state.apply_state(json!({})).is_err());
}

#[test]
fn test_plugin_registry_register_and_deregister() {
    let registry = PluginRegistry::new();
    registry.register("Foo@g1", Arc::new(CounterMod::new("Foo")));
    assert!(registry.contains("Foo@g1"));
    assert_eq!(registry.len(), 1);

    assert!(registry.deregister("Foo@g1").is_some());
    assert!(registry.deregister("Foo@g1").is_none());
    assert!(registry.is_empty());
}

#[test]
fn test_legacy_list_keeps_activation_order() {
    let list = LegacyModList::new();
    for key in ["c@g1", "a@g1", "b@g1"] {
        list.push(key, Arc::new(GreeterMod::new(key)) as Arc<dyn ModObject>);
    }
    assert_eq!(list.keys(), vec!["c@g1", "a@g1", "b@g1"]);

    assert!(list.remove("a@g1").is_some());
    assert!(!list.contains("a@g1"));
    assert_eq!(list.keys(), vec!["c@g1", "b@g1"]);
}
