// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Lifecycle wrappers for the module kinds.
//!
//! ```text
//!                initialize(host, unit)            unload(host)
//! Library        -                                 -
//! Plugin         instantiate -> plugins.register   plugins.deregister -> destroy
//! LegacyMod      instantiate -> init -> enable     legacy_mods.remove -> disable
//!                -> legacy_mods.push
//! ```
//!
//! The [`ReloadAware`] capability of the entry instance is resolved once in
//! `initialize` and kept alongside it; `capture_state` and `apply_state`
//! are no-ops for instances without it.

use std::fmt;
use std::sync::Arc;

use crate::error::ModuleError;
use crate::host::{CodeUnit, HostRuntime, ModObject, ReloadAware, StatePayload};
use crate::module::{ModuleKind, ModuleMarker};

/// Lifecycle contract shared by every descriptor kind.
pub trait Lifecycle {
    /// Logical module name.
    fn module(&self) -> &str;

    /// Instantiates and registers the entry point of a loaded unit.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::Init` if the host cannot instantiate the entry
    /// type or one of its hooks fails.
    fn initialize(
        &mut self,
        host: &dyn HostRuntime,
        unit: &Arc<CodeUnit>,
    ) -> Result<(), ModuleError>;

    /// Deregisters and tears down the entry point.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::Unload` if a teardown hook fails. The instance
    /// is released either way.
    fn unload(&mut self, host: &dyn HostRuntime) -> Result<(), ModuleError>;

    /// Captures reload state; `None` if the entry point carries none.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::State` if the capability fails.
    fn capture_state(&self) -> Result<Option<StatePayload>, ModuleError>;

    /// Replays state captured from the previous generation.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::State` if the capability rejects the payload.
    fn apply_state(&self, payload: StatePayload) -> Result<(), ModuleError>;

    /// The live entry instance, if initialized.
    fn instance(&self) -> Option<&Arc<dyn ModObject>>;

    /// Whether the live instance exposes [`ReloadAware`].
    fn is_reload_aware(&self) -> bool;
}

/// Code-only module.
#[derive(Debug, Clone)]
pub struct LibraryDescriptor {
    module: String,
}

impl LibraryDescriptor {
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
        }
    }
}

impl Lifecycle for LibraryDescriptor {
    fn module(&self) -> &str {
        &self.module
    }

    fn initialize(
        &mut self,
        _host: &dyn HostRuntime,
        _unit: &Arc<CodeUnit>,
    ) -> Result<(), ModuleError> {
        Ok(())
    }

    fn unload(&mut self, _host: &dyn HostRuntime) -> Result<(), ModuleError> {
        Ok(())
    }

    fn capture_state(&self) -> Result<Option<StatePayload>, ModuleError> {
        Ok(None)
    }

    fn apply_state(&self, _payload: StatePayload) -> Result<(), ModuleError> {
        Ok(())
    }

    fn instance(&self) -> Option<&Arc<dyn ModObject>> {
        None
    }

    fn is_reload_aware(&self) -> bool {
        false
    }
}

/// An entry type plus its live instance.
struct EntrySlot {
    module: String,
    entry: String,
    key: Option<String>,
    instance: Option<Arc<dyn ModObject>>,
    reload: Option<Arc<dyn ReloadAware>>,
}

impl EntrySlot {
    fn new(module: String, entry: String) -> Self {
        Self {
            module,
            entry,
            key: None,
            instance: None,
            reload: None,
        }
    }

    fn init_error(&self, message: impl fmt::Display) -> ModuleError {
        ModuleError::Init {
            module: self.module.clone(),
            message: message.to_string(),
        }
    }

    fn instantiate(
        &self,
        host: &dyn HostRuntime,
        unit: &CodeUnit,
    ) -> Result<Arc<dyn ModObject>, ModuleError> {
        host.instantiate(unit, &self.entry)
            .map_err(|e| self.init_error(format!("{e:#}")))
    }

    fn fill(&mut self, key: &str, instance: Arc<dyn ModObject>) {
        self.reload = Arc::clone(&instance).reload_aware();
        self.key = Some(key.to_string());
        self.instance = Some(instance);
    }

    /// Releases every handle the slot holds on the instance.
    fn take(&mut self) -> Option<(String, Arc<dyn ModObject>)> {
        self.reload = None;
        let key = self.key.take()?;
        let instance = self.instance.take()?;
        Some((key, instance))
    }

    fn capture_state(&self) -> Result<Option<StatePayload>, ModuleError> {
        let Some(reload) = &self.reload else {
            return Ok(None);
        };
        reload.capture_state().map_err(|e| ModuleError::State {
            module: self.module.clone(),
            message: format!("{e:#}"),
        })
    }

    fn apply_state(&self, payload: StatePayload) -> Result<(), ModuleError> {
        let Some(reload) = &self.reload else {
            return Ok(());
        };
        reload.apply_state(payload).map_err(|e| ModuleError::State {
            module: self.module.clone(),
            message: format!("{e:#}"),
        })
    }
}

impl fmt::Debug for EntrySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntrySlot")
            .field("module", &self.module)
            .field("entry", &self.entry)
            .field("key", &self.key)
            .field("live", &self.instance.is_some())
            .field("reload_aware", &self.reload.is_some())
            .finish()
    }
}

/// Module whose entry instance lives in the host's plugin registry.
#[derive(Debug)]
pub struct PluginDescriptor {
    slot: EntrySlot,
}

impl PluginDescriptor {
    #[must_use]
    pub fn new(module: impl Into<String>, entry: impl Into<String>) -> Self {
        Self {
            slot: EntrySlot::new(module.into(), entry.into()),
        }
    }

    #[must_use]
    pub fn entry(&self) -> &str {
        &self.slot.entry
    }
}

impl Lifecycle for PluginDescriptor {
    fn module(&self) -> &str {
        &self.slot.module
    }

    fn initialize(
        &mut self,
        host: &dyn HostRuntime,
        unit: &Arc<CodeUnit>,
    ) -> Result<(), ModuleError> {
        let instance = self.slot.instantiate(host, unit)?;
        host.plugins()
            .register(unit.internal_name(), Arc::clone(&instance));
        self.slot.fill(unit.internal_name(), instance);
        Ok(())
    }

    fn unload(&mut self, host: &dyn HostRuntime) -> Result<(), ModuleError> {
        let Some((key, instance)) = self.slot.take() else {
            return Ok(());
        };
        host.plugins().deregister(&key);
        instance.destroy().map_err(|e| ModuleError::Unload {
            module: self.slot.module.clone(),
            message: format!("{e:#}"),
        })
    }

    fn capture_state(&self) -> Result<Option<StatePayload>, ModuleError> {
        self.slot.capture_state()
    }

    fn apply_state(&self, payload: StatePayload) -> Result<(), ModuleError> {
        self.slot.apply_state(payload)
    }

    fn instance(&self) -> Option<&Arc<dyn ModObject>> {
        self.slot.instance.as_ref()
    }

    fn is_reload_aware(&self) -> bool {
        self.slot.reload.is_some()
    }
}

/// Module driven through init/enable/disable and the legacy mod list.
#[derive(Debug)]
pub struct LegacyModDescriptor {
    slot: EntrySlot,
}

impl LegacyModDescriptor {
    #[must_use]
    pub fn new(module: impl Into<String>, entry: impl Into<String>) -> Self {
        Self {
            slot: EntrySlot::new(module.into(), entry.into()),
        }
    }

    #[must_use]
    pub fn entry(&self) -> &str {
        &self.slot.entry
    }
}

impl Lifecycle for LegacyModDescriptor {
    fn module(&self) -> &str {
        &self.slot.module
    }

    fn initialize(
        &mut self,
        host: &dyn HostRuntime,
        unit: &Arc<CodeUnit>,
    ) -> Result<(), ModuleError> {
        let instance = self.slot.instantiate(host, unit)?;
        instance
            .init()
            .and_then(|()| instance.enable())
            .map_err(|e| self.slot.init_error(format!("{e:#}")))?;

        host.legacy_mods()
            .push(unit.internal_name(), Arc::clone(&instance));
        self.slot.fill(unit.internal_name(), instance);
        Ok(())
    }

    fn unload(&mut self, host: &dyn HostRuntime) -> Result<(), ModuleError> {
        let Some((key, instance)) = self.slot.take() else {
            return Ok(());
        };
        // Off the list before disable runs.
        host.legacy_mods().remove(&key);
        instance.disable().map_err(|e| ModuleError::Unload {
            module: self.slot.module.clone(),
            message: format!("{e:#}"),
        })
    }

    fn capture_state(&self) -> Result<Option<StatePayload>, ModuleError> {
        self.slot.capture_state()
    }

    fn apply_state(&self, payload: StatePayload) -> Result<(), ModuleError> {
        self.slot.apply_state(payload)
    }

    fn instance(&self) -> Option<&Arc<dyn ModObject>> {
        self.slot.instance.as_ref()
    }

    fn is_reload_aware(&self) -> bool {
        self.slot.reload.is_some()
    }
}

/// Closed set of module kinds.
#[derive(Debug)]
pub enum ModuleDescriptor {
    Library(LibraryDescriptor),
    Plugin(PluginDescriptor),
    LegacyMod(LegacyModDescriptor),
}

impl ModuleDescriptor {
    /// Builds the descriptor a marker asks for.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::MissingEntry` if a plugin or legacy marker has
    /// no entry type.
    pub fn from_marker(marker: &ModuleMarker) -> Result<Self, ModuleError> {
        let name = marker.name();
        let entry = || {
            marker.entry().ok_or_else(|| ModuleError::MissingEntry {
                module: name.to_string(),
                kind: marker.kind().to_string(),
            })
        };

        Ok(match marker.kind() {
            ModuleKind::Library => Self::Library(LibraryDescriptor::new(name)),
            ModuleKind::Plugin => Self::Plugin(PluginDescriptor::new(name, entry()?)),
            ModuleKind::Legacy => Self::LegacyMod(LegacyModDescriptor::new(name, entry()?)),
        })
    }

    #[must_use]
    pub const fn kind(&self) -> ModuleKind {
        match self {
            Self::Library(_) => ModuleKind::Library,
            Self::Plugin(_) => ModuleKind::Plugin,
            Self::LegacyMod(_) => ModuleKind::Legacy,
        }
    }
}

/// Delegates [`Lifecycle`] to the wrapped descriptor of each variant.
macro_rules! impl_lifecycle_for_descriptor {
    ($($variant:ident),+ $(,)?) => {
        impl Lifecycle for ModuleDescriptor {
            fn module(&self) -> &str {
                match self {
                    $(ModuleDescriptor::$variant(d) => Lifecycle::module(d),)+
                }
            }

            fn initialize(
                &mut self,
                host: &dyn HostRuntime,
                unit: &Arc<CodeUnit>,
            ) -> Result<(), ModuleError> {
                match self {
                    $(ModuleDescriptor::$variant(d) => Lifecycle::initialize(d, host, unit),)+
                }
            }

            fn unload(&mut self, host: &dyn HostRuntime) -> Result<(), ModuleError> {
                match self {
                    $(ModuleDescriptor::$variant(d) => Lifecycle::unload(d, host),)+
                }
            }

            fn capture_state(&self) -> Result<Option<StatePayload>, ModuleError> {
                match self {
                    $(ModuleDescriptor::$variant(d) => Lifecycle::capture_state(d),)+
                }
            }

            fn apply_state(&self, payload: StatePayload) -> Result<(), ModuleError> {
                match self {
                    $(ModuleDescriptor::$variant(d) => Lifecycle::apply_state(d, payload),)+
                }
            }

            fn instance(&self) -> Option<&Arc<dyn ModObject>> {
                match self {
                    $(ModuleDescriptor::$variant(d) => Lifecycle::instance(d),)+
                }
            }

            fn is_reload_aware(&self) -> bool {
                match self {
                    $(ModuleDescriptor::$variant(d) => Lifecycle::is_reload_aware(d),)+
                }
            }
        }
    };
}

impl_lifecycle_for_descriptor!(Library, Plugin, LegacyMod);
