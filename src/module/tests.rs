// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{
    ModuleImage, ModuleKind, ModuleVersion, internal_name, is_internal_name, render_module_binary,
};
use crate::error::ModuleError;

#[test]
fn test_internal_name() {
    assert_eq!(internal_name("Foo", 3), "Foo@g3");
    assert!(is_internal_name("Foo@g3"));
    assert!(is_internal_name("user@gmail@g12"));
    assert!(!is_internal_name("Foo"));
    assert!(!is_internal_name("Foo@g"));
    assert!(!is_internal_name("@g1"));
    assert!(!is_internal_name("user@gmail"));
}

#[test]
fn test_version_parse() {
    assert_eq!("1.2.3".parse::<ModuleVersion>().unwrap(), ModuleVersion::new(1, 2, 3));
    assert_eq!("v2.0".parse::<ModuleVersion>().unwrap(), ModuleVersion::new(2, 0, 0));
    assert_eq!(" 0.1.0 ".parse::<ModuleVersion>().unwrap(), ModuleVersion::new(0, 1, 0));

    for bad in ["", "1", "1.x", "1.2.3.4", "a.b.c", "1..2"] {
        assert!(
            matches!(bad.parse::<ModuleVersion>(), Err(ModuleError::InvalidVersion(_))),
            "{bad:?} should be rejected"
        );
    }
}

#[test]
fn test_version_ordering_and_compatibility() {
    let v = |s: &str| s.parse::<ModuleVersion>().unwrap();
    assert!(v("1.10.0") > v("1.9.9"));
    assert!(v("2.0.0") > v("1.99.99"));
    assert!(v("1.2.0") == v("1.2"));
    assert!(v("1.5.0").is_compatible_with(&v("1.0.0")));
    assert!(!v("2.0.0").is_compatible_with(&v("1.5.0")));
    assert_eq!(v("v1.2").to_string(), "1.2.0");
}

#[test]
fn test_parse_plugin_image() {
    let text = r#"
references = ["Bar", "System.Core"]

[module]
name = "Foo"
version = "1.2.0"
kind = "plugin"
entry = "counter"
components = ["counter", "hud"]
"#;
    let image = ModuleImage::parse("Foo.mod", text.as_bytes()).unwrap();
    let marker = image.marker().unwrap();

    assert_eq!(marker.name(), "Foo");
    assert_eq!(marker.version(), ModuleVersion::new(1, 2, 0));
    assert_eq!(marker.kind(), ModuleKind::Plugin);
    assert_eq!(marker.entry(), Some("counter"));
    assert_eq!(marker.components(), ["counter", "hud"]);
    assert_eq!(image.references(), ["Bar", "System.Core"]);
}

#[test]
fn test_parse_library_defaults() {
    let text = "[module]\nname = \"Bar\"\nversion = \"1.0\"\n";
    let image = ModuleImage::parse("Bar.mod", text.as_bytes()).unwrap();
    let marker = image.marker().unwrap();

    assert_eq!(marker.kind(), ModuleKind::Library);
    assert_eq!(marker.entry(), None);
    assert!(image.references().is_empty());
}

#[test]
fn test_parse_without_marker_is_not_a_module() {
    let image = ModuleImage::parse("data.mod", b"title = \"just data\"\n").unwrap();
    assert!(image.marker().is_none());
}

#[test]
fn test_parse_failures() {
    assert!(matches!(
        ModuleImage::parse("bin.mod", &[0xff, 0xfe, 0x00]),
        Err(ModuleError::Parse { .. })
    ));
    assert!(matches!(
        ModuleImage::parse("bad.mod", b"[module\nname = "),
        Err(ModuleError::Parse { .. })
    ));
    assert!(matches!(
        ModuleImage::parse("v.mod", b"[module]\nname = \"X\"\nversion = \"one\"\n"),
        Err(ModuleError::InvalidVersion(_))
    ));
    assert!(matches!(
        ModuleImage::parse("e.mod", b"[module]\nname = \"X\"\nversion = \"1.0\"\nkind = \"legacy\"\n"),
        Err(ModuleError::MissingEntry { .. })
    ));
}

#[test]
fn test_rendered_binary_parses_back() {
    let text = render_module_binary(
        "Foo",
        ModuleVersion::new(1, 2, 0),
        ModuleKind::Legacy,
        Some("greeter"),
        &["Bar"],
    );
    assert_eq!(
        text,
        "references = [\"Bar\"]\n\n[module]\nname = \"Foo\"\nversion = \"1.2.0\"\n\
         kind = \"legacy\"\nentry = \"greeter\"\ncomponents = [\"greeter\"]\n"
    );

    let image = ModuleImage::parse("Foo.mod", text.as_bytes()).unwrap();
    assert_eq!(image.marker().unwrap().kind(), ModuleKind::Legacy);
    assert_eq!(image.references(), ["Bar"]);
}
