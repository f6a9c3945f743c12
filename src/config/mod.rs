// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for hotmod.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. hotmod.toml (cwd, optional)
//! 3. --ini FILE (repeatable)
//! 4. HOTMOD_* env vars
//! 5. --set KEY=VALUE overrides
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! HOTMOD_PATHS__MODS=/srv/mods      → paths.mods = "/srv/mods"
//! HOTMOD_RELOAD__LEAK_CHECK=false   → reload.leak_check = false
//! ```

pub mod loader;
pub mod types;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;

pub use loader::ConfigLoader;
pub use types::{
    GlobalConfig, LoaderConfig, PatchHookConfig, PathsConfig, PoolConfig, ReloadConfig,
};

/// Name of the optional config file picked up from the working directory.
pub const CONFIG_FILE_NAME: &str = "hotmod.toml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "HOTMOD";

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Global options.
    pub global: GlobalConfig,
    /// Filesystem locations.
    pub paths: PathsConfig,
    /// Module pool filters.
    pub pool: PoolConfig,
    /// Loader options.
    pub loader: LoaderConfig,
    /// Reload options.
    pub reload: ReloadConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use hotmod::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file_optional("hotmod.toml")
    ///     .with_env_prefix("HOTMOD")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Resolve paths and validate values.
    ///
    /// # Errors
    ///
    /// Returns an error if path resolution fails or a blacklist or entry
    /// pattern is not a valid glob.
    pub fn resolve_and_validate(&mut self) -> Result<()> {
        self.paths.resolve()?;
        crate::pool::PoolOptions::new().with_blacklist(&self.pool.blacklist)?;
        crate::storage::walk::compile_glob(&self.pool.pattern)?;
        Ok(())
    }

    /// Format configuration options for display.
    ///
    /// Output is ordered by key and aligned on `=`.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        self.format_global_options(&mut options);
        self.format_paths_options(&mut options);
        self.format_pool_options(&mut options);
        self.format_loader_options(&mut options);
        self.format_reload_options(&mut options);

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }

    fn format_global_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "global.output_log_level".into(),
            self.global.output_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level".into(),
            self.global.file_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.log_file".into(),
            self.global.log_file.display().to_string(),
        );
    }

    fn format_paths_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "paths.mods".into(),
            self.paths
                .mods
                .as_ref()
                .map_or_else(String::new, |p| p.display().to_string()),
        );
    }

    fn format_pool_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert("pool.blacklist".into(), self.pool.blacklist.join(", "));
        options.insert("pool.disabled".into(), self.pool.disabled.join(", "));
        options.insert("pool.pattern".into(), self.pool.pattern.clone());
    }

    fn format_loader_options(&self, options: &mut BTreeMap<String, String>) {
        for (i, hook) in self.loader.patch_hooks.iter().enumerate() {
            let mut command = hook.command.display().to_string();
            for arg in &hook.args {
                command.push(' ');
                command.push_str(arg);
            }
            options.insert(
                format!("loader.patch_hooks.{i}"),
                format!("{}: {command}", hook.name),
            );
        }
    }

    fn format_reload_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "reload.leak_check".into(),
            self.reload.leak_check.to_string(),
        );
        options.insert(
            "reload.poll_interval_ms".into(),
            self.reload.poll_interval_ms.to_string(),
        );
    }
}
