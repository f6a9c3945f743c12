// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!              HotmodError (~24 bytes)
//!                     |
//!   +------+------+---+---+------+------+------+
//!   |      |      |       |      |      |      |
//!   v      v      v       v      v      v      v
//! Cfg   Module  Pool    Load  Storage Patch   Job  Io/Other
//! Box    Box    Box     Box    Box    Box    Box   Box<str>
//!
//! Sub-errors (unboxed internally):
//!   Config  ParseError, MissingKey, InvalidValue
//!   Module  Parse, MissingMarker, InvalidVersion, Init, Unload, State
//!   Pool    VersionConflict
//!   Load    DependencyCycle, Host, MissingDependency, Aborted
//!   Storage RootNotFound, Read
//!   Patch   CommandFailed, SpawnFailed
//!   Job     Panicked
//!
//! All variants boxed => HotmodError fits in 24 bytes.
//! ```
//!
//! Most of these never propagate out of the core: per-module failures are
//! turned into fatal tracker messages by the pool, loader and orchestrator.

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`HotmodError`].
pub type HotmodResult<T> = std::result::Result<T, HotmodError>;

/// Top-level application error type.
///
/// All sub-errors are boxed to keep this enum at ~24 bytes on the stack.
#[derive(Debug, Error)]
pub enum HotmodError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// A single module failed somewhere in its lifecycle.
    #[error("module error: {0}")]
    Module(#[from] Box<ModuleError>),

    /// Pool construction error.
    #[error("pool error: {0}")]
    Pool(#[from] Box<PoolError>),

    /// Loader pipeline error.
    #[error("load error: {0}")]
    Load(#[from] Box<LoadError>),

    /// Bundle storage error.
    #[error("storage error: {0}")]
    Storage(#[from] Box<StorageError>),

    /// Patch hook error.
    #[error("patch error: {0}")]
    Patch(#[from] Box<PatchError>),

    /// Background job error.
    #[error("job error: {0}")]
    Job(#[from] Box<JobError>),

    /// I/O error.
    #[error("io error: {0}")]
    Io(Box<std::io::Error>),

    /// Generic error with message.
    #[error("{0}")]
    Other(Box<str>),
}

/// Create a generic [`HotmodError::Other`].
pub fn other(message: impl Into<String>) -> HotmodError {
    HotmodError::Other(message.into().into_boxed_str())
}

// --- From implementations for boxing ---

/// Macro to generate `From` implementations that box the source error.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for HotmodError {
                fn from(err: $error) -> Self {
                    HotmodError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    ConfigError => Config,
    ModuleError => Module,
    PoolError => Pool,
    LoadError => Load,
    StorageError => Storage,
    PatchError => Patch,
    JobError => Job,
    std::io::Error => Io,
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Missing required configuration key.
    #[error("missing required config key '{key}' in section '[{section}]'")]
    MissingKey { section: String, key: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

// --- Module Errors ---

/// Errors scoped to a single module.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The binary could not be read as a module image.
    #[error("failed to parse module binary '{entry}': {message}")]
    Parse { entry: String, message: String },

    /// The version string is not `major.minor[.patch]`.
    #[error("invalid module version '{0}'")]
    InvalidVersion(String),

    /// The marker names a kind that needs an entry type but declares none.
    #[error("module '{module}' of kind '{kind}' declares no entry type")]
    MissingEntry { module: String, kind: String },

    /// The host has no entry type with this name.
    #[error("module '{module}': unknown entry type '{entry}'")]
    UnknownEntry { module: String, entry: String },

    /// Initialization hook failed.
    #[error("failed to initialize module '{module}': {message}")]
    Init { module: String, message: String },

    /// Unload hook failed.
    #[error("failed to unload module '{module}': {message}")]
    Unload { module: String, message: String },

    /// Capturing or applying reload state failed.
    #[error("reload state of module '{module}' failed: {message}")]
    State { module: String, message: String },
}

// --- Pool Errors ---

/// Errors raised while building a module pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Two candidates share a name but differ in major version.
    #[error(
        "version conflict for module '{module}': {incoming} from '{incoming_origin}' \
         is incompatible with {existing} from '{existing_origin}'"
    )]
    VersionConflict {
        module: String,
        existing: String,
        existing_origin: String,
        incoming: String,
        incoming_origin: String,
    },
}

// --- Load Errors ---

/// Errors raised by the loader pipeline.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The dependency graph contains a cycle.
    #[error("dependency cycle between modules: {}", members.join(", "))]
    DependencyCycle { members: Vec<String> },

    /// The host runtime rejected a module.
    #[error("host failed to load module '{module}': {message}")]
    Host { module: String, message: String },

    /// A dependency of this module did not load.
    #[error("module '{module}' skipped: dependency '{dependency}' failed to load")]
    MissingDependency { module: String, dependency: String },

    /// The loader reported fatal messages, so the reload was abandoned.
    #[error("reload of generation {generation} abandoned after {fatal_count} fatal error(s)")]
    Aborted { generation: u64, fatal_count: usize },
}

// --- Storage Errors ---

/// Bundle storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The mods root does not exist.
    #[error("mods root not found: {0}")]
    RootNotFound(String),

    /// Reading a bundle entry failed.
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The entry pattern is not a valid glob.
    #[error("invalid entry pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

// --- Patch Errors ---

/// Patch hook errors.
#[derive(Debug, Error)]
pub enum PatchError {
    /// Failed to spawn the patch command.
    #[error("failed to spawn patch command '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The patch command exited with a non-zero status.
    #[error("patch command '{command}' failed on '{target}' with code {code}")]
    CommandFailed {
        command: String,
        target: String,
        code: i32,
    },

    /// Staging the binary for the command failed.
    #[error("failed to stage '{target}' for patching: {source}")]
    Staging {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

// --- Job Errors ---

/// Background job errors.
#[derive(Debug, Error)]
pub enum JobError {
    /// The work closure panicked.
    #[error("job panicked: {0}")]
    Panicked(String),
}
