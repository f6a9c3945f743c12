// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Module metadata and lifecycle wrappers.
//!
//! ```text
//! bytes --ModuleImage::parse--> ModuleImage { marker, references }
//!                                   |
//!                     ModuleMarker { name, version, kind, entry }
//!                                   |
//!                  ModuleDescriptor::from_marker
//!                 /            |              \
//!           Library         Plugin         LegacyMod
//! ```

pub mod descriptor;
pub mod image;
pub mod version;

pub use descriptor::{Lifecycle, ModuleDescriptor};
pub use image::{ModuleImage, ModuleKind, ModuleMarker, render_module_binary};
pub use version::ModuleVersion;

/// Separator between a module name and its generation tag.
pub const GENERATION_SEPARATOR: &str = "@g";

/// Returns the host-side name of `module` in `generation`.
#[must_use]
pub fn internal_name(module: &str, generation: u64) -> String {
    format!("{module}{GENERATION_SEPARATOR}{generation}")
}

/// Returns whether `name` carries a generation tag.
#[must_use]
pub fn is_internal_name(name: &str) -> bool {
    name.rsplit_once(GENERATION_SEPARATOR)
        .is_some_and(|(module, tag)| {
            !module.is_empty() && !tag.is_empty() && tag.bytes().all(|b| b.is_ascii_digit())
        })
}

#[cfg(test)]
mod tests;
