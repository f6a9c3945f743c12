// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-process host backed by a catalog of entry-type factories.
//!
//! ```text
//! CatalogHost::new()
//!   .with_entry("counter", factory)
//!   .with_reserved("hotmod")
//!        |
//!   load(image)         every reference must already be loaded,
//!                       internal name must be unused
//!   instantiate(unit, e) catalog[e](unit)
//!   unload_unit(unit)    frees the internal name
//! ```
//!
//! Code units are tracked by internal name, so loading the same module twice
//! without a fresh generation suffix is rejected like a duplicate type in a
//! real runtime's namespace.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{CodeUnit, HostRuntime, LegacyModList, ModObject, PluginRegistry, PreparedImage};
use crate::error::Result;
use crate::module::is_internal_name;

/// Constructor for an entry type.
pub type EntryFactory = Arc<dyn Fn(&CodeUnit) -> Result<Arc<dyn ModObject>> + Send + Sync>;

/// Host runtime that instantiates entry types from registered factories.
#[derive(Default)]
pub struct CatalogHost {
    catalog: BTreeMap<String, EntryFactory>,
    reserved: Vec<String>,
    units: Mutex<BTreeMap<String, Arc<CodeUnit>>>,
    load_log: Mutex<Vec<String>>,
    plugins: PluginRegistry,
    legacy_mods: LegacyModList,
}

impl CatalogHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for the entry type `entry`.
    #[must_use]
    pub fn with_entry<F>(mut self, entry: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&CodeUnit) -> Result<Arc<dyn ModObject>> + Send + Sync + 'static,
    {
        self.catalog.insert(entry.into(), Arc::new(factory));
        self
    }

    /// Reserves a module name for the host itself.
    #[must_use]
    pub fn with_reserved(mut self, name: impl Into<String>) -> Self {
        self.reserved.push(name.into());
        self
    }

    /// Entry types this host can instantiate.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.catalog.keys().cloned().collect()
    }

    /// Internal names of currently loaded units.
    #[must_use]
    pub fn loaded_units(&self) -> Vec<String> {
        self.lock_units().keys().cloned().collect()
    }

    /// Every internal name ever loaded, in load order.
    #[must_use]
    pub fn load_log(&self) -> Vec<String> {
        self.load_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_units(&self) -> MutexGuard<'_, BTreeMap<String, Arc<CodeUnit>>> {
        self.units.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HostRuntime for CatalogHost {
    fn load(&self, image: &PreparedImage) -> Result<Arc<CodeUnit>> {
        let mut units = self.lock_units();

        if units.contains_key(image.internal_name()) {
            anyhow::bail!(
                "'{}' is already loaded in the host namespace",
                image.internal_name()
            );
        }

        // References that name a pool member carry a generation suffix; bare
        // names are host or system libraries and are assumed present.
        if let Some(missing) = image
            .references()
            .iter()
            .filter(|r| is_internal_name(r))
            .find(|r| !units.contains_key(r.as_str()))
        {
            anyhow::bail!("unresolved reference to '{missing}'");
        }

        let unit = Arc::new(CodeUnit::from_image(image));
        units.insert(image.internal_name().to_string(), Arc::clone(&unit));
        self.load_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(image.internal_name().to_string());

        tracing::debug!(unit = %image.internal_name(), "Loaded code unit");
        Ok(unit)
    }

    fn instantiate(&self, unit: &CodeUnit, entry: &str) -> Result<Arc<dyn ModObject>> {
        let factory = self.catalog.get(entry).ok_or_else(|| {
            anyhow::anyhow!(
                "'{}' has no entry type '{entry}' in the host catalog",
                unit.internal_name()
            )
        })?;
        factory(unit)
    }

    fn unload_unit(&self, unit: &CodeUnit) {
        if self.lock_units().remove(unit.internal_name()).is_some() {
            tracing::debug!(unit = %unit.internal_name(), "Unloaded code unit");
        }
    }

    fn reserved_names(&self) -> Vec<String> {
        self.reserved.clone()
    }

    fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    fn legacy_mods(&self) -> &LegacyModList {
        &self.legacy_mods
    }
}

impl std::fmt::Debug for CatalogHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogHost")
            .field("entries", &self.entries())
            .field("reserved", &self.reserved)
            .field("units", &self.loaded_units())
            .finish_non_exhaustive()
    }
}
