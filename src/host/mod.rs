// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Host runtime boundary.
//!
//! ```text
//! ModuleLoader --PreparedImage--> HostRuntime::load --> Arc<CodeUnit>
//! ModuleDescriptor --entry------> HostRuntime::instantiate --> Arc<dyn ModObject>
//!                                    |
//!                      +-------------+-------------+
//!                      v                           v
//!               PluginRegistry               LegacyModList
//!          (plugin-style instances)     (legacy mods, load order)
//! ```
//!
//! The core never looks inside a code unit; it only hands the host prepared
//! images in dependency order and asks it for entry-type instances.
//! [`CatalogHost`] is an in-process implementation backed by a factory
//! catalog.

pub mod catalog;
pub mod demo;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Result;

pub use catalog::CatalogHost;

/// Opaque reload-state payload carried between generations.
pub type StatePayload = serde_json::Value;

/// A module binary ready to be loaded: dependency-ordered and with its
/// cross-references rewritten to generation-suffixed internal names.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    module: String,
    internal_name: String,
    generation: u64,
    references: Vec<String>,
    bytes: Vec<u8>,
}

impl PreparedImage {
    #[must_use]
    pub const fn new(
        module: String,
        internal_name: String,
        generation: u64,
        references: Vec<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            module,
            internal_name,
            generation,
            references,
            bytes,
        }
    }

    /// Logical module name.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Generation-suffixed name the host registers the unit under.
    #[must_use]
    pub fn internal_name(&self) -> &str {
        &self.internal_name
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Internal names of referenced pool members, plus any external names.
    #[must_use]
    pub fn references(&self) -> &[String] {
        &self.references
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A code unit the host has loaded.
#[derive(Debug)]
pub struct CodeUnit {
    module: String,
    internal_name: String,
    generation: u64,
    references: Vec<String>,
}

impl CodeUnit {
    #[must_use]
    pub fn from_image(image: &PreparedImage) -> Self {
        Self {
            module: image.module().to_string(),
            internal_name: image.internal_name().to_string(),
            generation: image.generation(),
            references: image.references().to_vec(),
        }
    }

    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    #[must_use]
    pub fn internal_name(&self) -> &str {
        &self.internal_name
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn references(&self) -> &[String] {
        &self.references
    }
}

/// An instantiated module entry type.
///
/// Plugin-style objects only see [`ModObject::destroy`]; legacy mods go
/// through `init`, `enable` and `disable`.
pub trait ModObject: Send + Sync {
    /// Legacy initialization, called right after instantiation.
    fn init(&self) -> Result<()> {
        Ok(())
    }

    /// Legacy enable hook, called after `init`.
    fn enable(&self) -> Result<()> {
        Ok(())
    }

    /// Legacy disable hook, called after removal from the mod list.
    fn disable(&self) -> Result<()> {
        Ok(())
    }

    /// Plugin teardown, called after deregistration.
    fn destroy(&self) -> Result<()> {
        Ok(())
    }

    /// Exposes the reload-state capability, if the object has one.
    fn reload_aware(self: Arc<Self>) -> Option<Arc<dyn ReloadAware>> {
        None
    }
}

/// Optional capability: state that survives a reload.
pub trait ReloadAware: Send + Sync {
    /// Returns the state to hand to the next generation; `None` means
    /// there is nothing to carry over.
    ///
    /// # Errors
    ///
    /// Implementations return an error if the state cannot be captured.
    fn capture_state(&self) -> Result<Option<StatePayload>>;

    /// Receives the state captured from the previous generation.
    ///
    /// # Errors
    ///
    /// Implementations return an error if the payload cannot be applied.
    fn apply_state(&self, payload: StatePayload) -> Result<()>;
}

/// The host runtime collaborator.
pub trait HostRuntime: Send + Sync {
    /// Loads a prepared image.
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects the image, e.g. an unresolved
    /// reference or a name already present in its namespace.
    fn load(&self, image: &PreparedImage) -> Result<Arc<CodeUnit>>;

    /// Instantiates the entry type `entry` from a loaded unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit has no such entry type or its
    /// constructor fails.
    fn instantiate(&self, unit: &CodeUnit, entry: &str) -> Result<Arc<dyn ModObject>>;

    /// Forgets a unit after its module has been unloaded.
    fn unload_unit(&self, _unit: &CodeUnit) {}

    /// Drops any host-side caches that may still hold module objects.
    fn collect_garbage(&self) {}

    /// Module names owned by the host itself; never loaded from bundles.
    fn reserved_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Registry of plugin-style instances.
    fn plugins(&self) -> &PluginRegistry;

    /// List of active legacy mods.
    fn legacy_mods(&self) -> &LegacyModList;
}

/// Host-side registry of plugin-style instances, keyed by internal name.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Mutex<BTreeMap<String, Arc<dyn ModObject>>>,
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an instance, replacing any previous one under `key`.
    pub fn register(&self, key: &str, object: Arc<dyn ModObject>) {
        if self.lock().insert(key.to_string(), object).is_some() {
            tracing::warn!(plugin = %key, "Replaced an already registered plugin");
        }
    }

    /// Removes and returns the instance under `key`.
    pub fn deregister(&self, key: &str) -> Option<Arc<dyn ModObject>> {
        self.lock().remove(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Arc<dyn ModObject>>> {
        self.plugins.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.keys())
            .finish()
    }
}

/// Host-side list of active legacy mods, in activation order.
#[derive(Default)]
pub struct LegacyModList {
    mods: Mutex<Vec<(String, Arc<dyn ModObject>)>>,
}

impl LegacyModList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a mod to the end of the list.
    pub fn push(&self, key: &str, object: Arc<dyn ModObject>) {
        self.lock().push((key.to_string(), object));
    }

    /// Removes the mod under `key`, returning it.
    pub fn remove(&self, key: &str) -> Option<Arc<dyn ModObject>> {
        let mut mods = self.lock();
        let index = mods.iter().position(|(k, _)| k == key)?;
        Some(mods.remove(index).1)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.lock().iter().any(|(k, _)| k == key)
    }

    /// Keys in activation order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.lock().iter().map(|(k, _)| k.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, Arc<dyn ModObject>)>> {
        self.mods.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for LegacyModList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyModList")
            .field("mods", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests;
