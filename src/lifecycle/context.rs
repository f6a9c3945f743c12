// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Explicit host context threaded through every reload.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::config::Config;
use crate::error::Result;
use crate::host::HostRuntime;
use crate::patch::{CommandPatcher, Patcher};
use crate::pool::PoolOptions;
use crate::storage::{DirectoryStorage, Storage};

bitflags! {
    /// Optional steps of a reload.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ReloadFlags: u8 {
        /// Capture state from the outgoing generation.
        const CAPTURE_STATE = 0x01;

        /// Replay captured state into the incoming generation.
        const REPLAY_STATE = 0x02;

        /// Report objects that survive unloading.
        const LEAK_CHECK = 0x04;
    }
}

impl Default for ReloadFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Everything the orchestrator needs from the outside world.
pub struct HostContext {
    host: Arc<dyn HostRuntime>,
    storage: Arc<dyn Storage>,
    patchers: Vec<Arc<dyn Patcher>>,
    pool_options: PoolOptions,
    flags: ReloadFlags,
}

impl HostContext {
    /// Context with no patch hooks and the host's reserved names
    /// blacklisted.
    #[must_use]
    pub fn new(host: Arc<dyn HostRuntime>, storage: Arc<dyn Storage>) -> Self {
        let pool_options = PoolOptions::new().with_reserved(host.reserved_names());
        Self {
            host,
            storage,
            patchers: Vec::new(),
            pool_options,
            flags: ReloadFlags::default(),
        }
    }

    /// Builds the context described by `config` around `host`.
    ///
    /// # Errors
    ///
    /// Returns an error if `paths.mods` is unset or a pool glob is invalid.
    pub fn from_config(config: &Config, host: Arc<dyn HostRuntime>) -> Result<Self> {
        let storage = DirectoryStorage::new(config.paths.mods_root()?, &config.pool.pattern)?;
        let options = PoolOptions::new()
            .with_blacklist(&config.pool.blacklist)?
            .with_disabled(config.pool.disabled.iter().cloned());
        let patchers = config.loader.patch_hooks.iter().map(|hook| {
            Arc::new(CommandPatcher::new(
                hook.name.clone(),
                hook.command.to_string_lossy(),
                hook.args.clone(),
            )) as Arc<dyn Patcher>
        });

        Ok(Self::new(host, Arc::new(storage))
            .with_patchers(patchers)
            .with_pool_options(options)
            .with_leak_check(config.reload.leak_check))
    }

    #[must_use]
    pub fn with_patchers(mut self, patchers: impl IntoIterator<Item = Arc<dyn Patcher>>) -> Self {
        self.patchers.extend(patchers);
        self
    }

    /// Replaces the pool filters; the host's reserved names are kept.
    #[must_use]
    pub fn with_pool_options(mut self, options: PoolOptions) -> Self {
        self.pool_options = options.with_reserved(self.host.reserved_names());
        self
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: ReloadFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_leak_check(mut self, enabled: bool) -> Self {
        self.flags.set(ReloadFlags::LEAK_CHECK, enabled);
        self
    }

    #[must_use]
    pub const fn host(&self) -> &Arc<dyn HostRuntime> {
        &self.host
    }

    #[must_use]
    pub const fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    #[must_use]
    pub fn patchers(&self) -> &[Arc<dyn Patcher>] {
        &self.patchers
    }

    #[must_use]
    pub const fn pool_options(&self) -> &PoolOptions {
        &self.pool_options
    }

    #[must_use]
    pub const fn flags(&self) -> ReloadFlags {
        self.flags
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext")
            .field("storage", &self.storage.describe())
            .field(
                "patchers",
                &self.patchers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("pool_options", &self.pool_options)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
