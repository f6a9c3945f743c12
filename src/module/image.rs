// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Metadata view of a candidate module binary.
//!
//! A module binary is a UTF-8 TOML document. Only two things are read from
//! it: the `[module]` marker and the list of referenced module names.
//!
//! ```toml
//! references = ["Bar"]
//!
//! [module]
//! name = "Foo"
//! version = "1.2.0"
//! kind = "plugin"        # library | plugin | legacy
//! entry = "counter"      # entry type, required unless kind = library
//! components = ["counter", "hud"]
//! ```
//!
//! A binary without a `[module]` table parses fine but is not a module.

use std::fmt;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::version::ModuleVersion;
use crate::error::ModuleError;

/// How a module hooks into the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// Code only, no entry point.
    #[default]
    Library,
    /// Entry type registered with the host's plugin registry.
    Plugin,
    /// Entry type driven through init/enable/disable and the legacy mod list.
    Legacy,
}

impl ModuleKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Library => "library",
            Self::Plugin => "plugin",
            Self::Legacy => "legacy",
        }
    }

    /// Returns whether this kind needs an entry type.
    #[must_use]
    pub const fn has_entry(&self) -> bool {
        !matches!(self, Self::Library)
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The declared identity of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleMarker {
    name: String,
    version: ModuleVersion,
    kind: ModuleKind,
    entry: Option<String>,
    components: Vec<String>,
}

impl ModuleMarker {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn version(&self) -> ModuleVersion {
        self.version
    }

    #[must_use]
    pub const fn kind(&self) -> ModuleKind {
        self.kind
    }

    /// Entry type name; always `Some` for plugin and legacy modules.
    #[must_use]
    pub fn entry(&self) -> Option<&str> {
        self.entry.as_deref()
    }

    /// Declared sub-components.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.components
    }
}

#[derive(Debug, Deserialize)]
struct RawImage {
    module: Option<RawMarker>,
    #[serde(default)]
    references: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawMarker {
    name: String,
    version: String,
    #[serde(default)]
    kind: ModuleKind,
    entry: Option<String>,
    #[serde(default)]
    components: Vec<String>,
}

/// Parsed metadata of a module binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleImage {
    marker: Option<ModuleMarker>,
    references: Vec<String>,
}

impl ModuleImage {
    /// Parses the metadata of the binary `entry`.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::Parse` if the bytes are not UTF-8 TOML,
    /// `ModuleError::InvalidVersion` for a malformed marker version and
    /// `ModuleError::MissingEntry` when a plugin or legacy marker has no entry.
    pub fn parse(entry: &str, bytes: &[u8]) -> Result<Self, ModuleError> {
        let parse_error = |message: String| ModuleError::Parse {
            entry: entry.to_string(),
            message,
        };

        let text = std::str::from_utf8(bytes).map_err(|e| parse_error(e.to_string()))?;

        let raw: RawImage = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()
            .and_then(|cfg| cfg.try_deserialize::<RawImage>())
            .map_err(|e| parse_error(e.to_string()))?;

        let marker = raw.module.map(validate_marker).transpose()?;

        Ok(Self {
            marker,
            references: raw.references,
        })
    }

    /// Builds an image directly; used by in-memory storage and tests.
    #[must_use]
    pub const fn new(marker: Option<ModuleMarker>, references: Vec<String>) -> Self {
        Self { marker, references }
    }

    /// Returns the module marker, if the binary declares one.
    #[must_use]
    pub const fn marker(&self) -> Option<&ModuleMarker> {
        self.marker.as_ref()
    }

    /// Names of other modules this binary references.
    #[must_use]
    pub fn references(&self) -> &[String] {
        &self.references
    }
}

fn validate_marker(raw: RawMarker) -> Result<ModuleMarker, ModuleError> {
    let version: ModuleVersion = raw.version.parse()?;
    let entry = raw.entry.filter(|e| !e.trim().is_empty());

    if raw.kind.has_entry() && entry.is_none() {
        return Err(ModuleError::MissingEntry {
            module: raw.name,
            kind: raw.kind.to_string(),
        });
    }

    Ok(ModuleMarker {
        name: raw.name,
        version,
        kind: raw.kind,
        entry,
        components: raw.components,
    })
}

/// Renders a module binary in the format [`ModuleImage::parse`] reads.
///
/// Used by tooling and tests to author bundles.
#[must_use]
pub fn render_module_binary(
    name: &str,
    version: ModuleVersion,
    kind: ModuleKind,
    entry: Option<&str>,
    references: &[&str],
) -> String {
    let quote = |s: &str| format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""));
    let list = |items: &[&str]| {
        items
            .iter()
            .map(|s| quote(s))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut out = String::new();
    if !references.is_empty() {
        let _ = writeln!(out, "references = [{}]\n", list(references));
    }
    let _ = writeln!(out, "[module]");
    let _ = writeln!(out, "name = {}", quote(name));
    let _ = writeln!(out, "version = {}", quote(&version.to_string()));
    let _ = writeln!(out, "kind = {}", quote(kind.as_str()));
    if let Some(entry) = entry {
        let _ = writeln!(out, "entry = {}", quote(entry));
        let _ = writeln!(out, "components = [{}]", quote(entry));
    }
    out
}
