// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration types for hotmod.
//!
//! # Config Structure
//!
//! ```text
//! Config: GlobalConfig, PathsConfig, PoolConfig, LoaderConfig, ReloadConfig
//! LoaderConfig.patch_hooks: [PatchHookConfig { name, command, args }]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::logging::LogLevel;
use crate::storage::DEFAULT_PATTERN;

/// Global configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Log level for stdout output (0-6).
    pub output_log_level: LogLevel,
    /// Log level for file output (0-6).
    pub file_log_level: LogLevel,
    /// Path to log file.
    pub log_file: PathBuf,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            output_log_level: LogLevel::INFO,
            file_log_level: LogLevel::TRACE,
            log_file: PathBuf::from("hotmod.log"),
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Mods root; every immediate sub-directory is a bundle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mods: Option<PathBuf>,
}

impl PathsConfig {
    /// Makes `mods` absolute against the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn resolve(&mut self) -> Result<()> {
        if let Some(mods) = &self.mods
            && mods.is_relative()
        {
            let cwd = std::env::current_dir()?;
            self.mods = Some(cwd.join(mods));
        }
        Ok(())
    }

    /// The mods root, or [`ConfigError::MissingKey`] if unset.
    ///
    /// # Errors
    ///
    /// Returns an error if `paths.mods` is not configured.
    pub fn mods_root(&self) -> std::result::Result<&Path, ConfigError> {
        self.mods.as_deref().ok_or_else(|| ConfigError::MissingKey {
            section: "paths".to_string(),
            key: "mods".to_string(),
        })
    }
}

/// Module pool filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Globs matched against entry file stems and module names.
    pub blacklist: Vec<String>,
    /// Module names switched off by the user.
    pub disabled: Vec<String>,
    /// Glob selecting module binaries inside a bundle.
    pub pattern: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            blacklist: Vec::new(),
            disabled: Vec::new(),
            pattern: DEFAULT_PATTERN.to_string(),
        }
    }
}

/// An external command run once per module binary before loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchHookConfig {
    /// Name used in messages.
    pub name: String,
    /// Program to run.
    pub command: PathBuf,
    /// Arguments; `{file}` is replaced by the staged binary path.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Loader options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Patch hooks, run in order.
    pub patch_hooks: Vec<PatchHookConfig>,
}

/// Reload options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReloadConfig {
    /// Report objects of the previous generation that survive unloading.
    pub leak_check: bool,
    /// How often the CLI polls a running reload, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            leak_check: true,
            poll_interval_ms: 50,
        }
    }
}
